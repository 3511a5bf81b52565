// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document container, the in-memory page-structured model every operation
// works on, backed by `lopdf`.
//
// Pages are addressed by 0-based index in page-tree order. Rotation is always
// read and written normalised into [0, 360).

use std::collections::HashMap;

use docmorph_core::RgbColor;
use docmorph_core::error::{DocMorphError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId, SaveOptions, Stream, StringFormat};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use super::copy::ObjectCopier;

/// US Letter, used when a page tree carries no MediaBox at all.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Page attributes a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Upper bound on page-tree depth when walking `/Parent` links.
const MAX_TREE_DEPTH: usize = 64;

const OVERLAY_FONT_NAME: &str = "DocMorphF1";

/// Value snapshot of one page's geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// 0-based position in the document.
    pub index: usize,
    /// Lower-left corner of the effective MediaBox.
    pub origin: (f32, f32),
    pub width: f32,
    pub height: f32,
    /// Clockwise display rotation in `[0, 360)`.
    pub rotation: i32,
    /// Content stream objects drawn for this page, in order.
    pub content_ids: Vec<ObjectId>,
}

/// Document information dictionary fields the engine reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub producer: Option<String>,
    pub creator: Option<String>,
}

impl DocumentMetadata {
    /// Info dictionary keys in the same order as the struct fields.
    pub const KEYS: [&'static [u8]; 5] = [b"Title", b"Subject", b"Keywords", b"Producer", b"Creator"];

    fn fields(&self) -> [&Option<String>; 5] {
        [&self.title, &self.subject, &self.keywords, &self.producer, &self.creator]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|field| field.is_none())
    }
}

/// A page copied into a container but not yet attached to its page tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle(ObjectId);

/// Re-serialization passes applied by [`DocumentContainer::to_bytes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Flate-encode streams that carry no filter yet.
    pub compress_streams: bool,
    /// Drop streams with no content.
    pub delete_zero_length_streams: bool,
    /// Drop objects unreachable from the trailer.
    pub prune_unreferenced: bool,
    /// Renumber remaining objects densely from 1.
    pub renumber: bool,
    /// Pack non-stream objects into object streams of at most this many
    /// objects, with a cross-reference stream.
    pub objects_per_stream: Option<usize>,
}

/// Owns one decoded document for the duration of a single operation.
pub struct DocumentContainer {
    document: Document,
    overlay_font: Option<ObjectId>,
    overlay_states: HashMap<u32, (String, ObjectId)>,
}

impl std::fmt::Debug for DocumentContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentContainer")
            .field("pages", &self.page_count())
            .field("objects", &self.document.objects.len())
            .finish()
    }
}

impl Default for DocumentContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentContainer {
    // -- Construction ---------------------------------------------------------

    /// Create an empty document with a catalog and a flat, empty page tree.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");

        let mut pages = Dictionary::new();
        pages.set("Type", "Pages");
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        let pages_id = document.add_object(Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", "Catalog");
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(Object::Dictionary(catalog));

        document.trailer.set("Root", Object::Reference(catalog_id));

        Self::wrap(document)
    }

    /// Parse a document from raw bytes.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| DocMorphError::parse(format!("failed to load PDF: {err}")))?;

        // A document whose catalog has no page tree cannot be worked on.
        document
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .map_err(|err| DocMorphError::parse(format!("document has no page tree: {err}")))?;

        let container = Self::wrap(document);
        debug!(pages = container.page_count(), "PDF loaded from bytes");
        Ok(container)
    }

    fn wrap(document: Document) -> Self {
        Self {
            document,
            overlay_font: None,
            overlay_states: HashMap::new(),
        }
    }

    /// Serialise the document, applying the requested passes first.
    #[instrument(skip_all, fields(options = ?options))]
    pub fn to_bytes(&mut self, options: &SerializeOptions) -> Result<Vec<u8>> {
        if options.delete_zero_length_streams {
            let removed = self.document.delete_zero_length_streams();
            debug!(removed = removed.len(), "deleted zero-length streams");
        }
        if options.prune_unreferenced {
            let pruned = self.document.prune_objects();
            debug!(pruned = pruned.len(), "pruned unreferenced objects");
        }
        if options.renumber {
            self.document.renumber_objects();
        }
        if options.compress_streams {
            self.document.compress();
        }

        let mut output = Vec::new();
        let saved = match options.objects_per_stream {
            Some(per_stream) => {
                let save_options = SaveOptions::builder()
                    .use_object_streams(true)
                    .use_xref_streams(true)
                    .max_objects_per_stream(per_stream)
                    .compression_level(6)
                    .build();
                self.document.save_with_options(&mut output, save_options)
            }
            None => self.document.save_to(&mut output),
        };
        saved.map_err(|err| DocMorphError::packaging(format!("failed to serialise document: {err}")))?;

        debug!(output_bytes = output.len(), "document serialised");
        Ok(output)
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Geometry snapshot of the page at `index`.
    pub fn page(&self, index: usize) -> Result<Page> {
        let page_id = self.page_id(index)?;

        let media_box = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| self.rectangle(&obj))
            .unwrap_or(DEFAULT_MEDIA_BOX);

        Ok(Page {
            index,
            origin: (media_box[0], media_box[1]),
            width: (media_box[2] - media_box[0]).abs(),
            height: (media_box[3] - media_box[1]).abs(),
            rotation: self.rotation_of(page_id),
            content_ids: self.content_ids(page_id),
        })
    }

    /// Every page in order.
    pub fn pages(&self) -> Result<Vec<Page>> {
        (0..self.page_count()).map(|index| self.page(index)).collect()
    }

    /// Decoded content of a page, all content streams concatenated.
    pub fn page_content(&self, index: usize) -> Result<Vec<u8>> {
        let page_id = self.page_id(index)?;
        self.document.get_page_content(page_id).map_err(|err| {
            DocMorphError::parse(format!("cannot decode content of page {}: {err}", index + 1))
        })
    }

    /// SHA-256 of the page's decoded content, as lowercase hex.
    ///
    /// Copies of a page share its fingerprint.
    pub fn page_fingerprint(&self, index: usize) -> Result<String> {
        let content = self.page_content(index)?;
        let mut hasher = Sha256::new();
        hasher.update(&content);
        Ok(hex::encode(hasher.finalize()))
    }

    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        u32::try_from(index + 1)
            .ok()
            .and_then(|number| pages.get(&number).copied())
            .ok_or_else(|| {
                DocMorphError::parse(format!(
                    "page index {index} out of range (document has {} pages)",
                    pages.len()
                ))
            })
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    // -- Rotation -------------------------------------------------------------

    /// Store `degrees` (normalised) as the page's rotation.
    pub fn set_rotation(&mut self, index: usize, degrees: i32) -> Result<()> {
        let page_id = self.page_id(index)?;
        let normalised = degrees.rem_euclid(360);
        self.page_dict_mut(page_id)?
            .set("Rotate", Object::Integer(i64::from(normalised)));
        Ok(())
    }

    fn rotation_of(&self, page_id: ObjectId) -> i32 {
        self.inherited(page_id, b"Rotate")
            .and_then(|obj| self.resolve(&obj).as_i64().ok())
            .map(|value| value.rem_euclid(360) as i32)
            .unwrap_or(0)
    }

    // -- Metadata -------------------------------------------------------------

    pub fn metadata(&self) -> DocumentMetadata {
        let Some(info) = self.info_dict() else {
            return DocumentMetadata::default();
        };
        let field = |key: &[u8]| -> Option<String> {
            lopdf::decode_text_string(self.resolve(info.get(key).ok()?)).ok()
        };
        DocumentMetadata {
            title: field(b"Title"),
            subject: field(b"Subject"),
            keywords: field(b"Keywords"),
            producer: field(b"Producer"),
            creator: field(b"Creator"),
        }
    }

    /// Write every `Some` field of `metadata` into the info dictionary,
    /// creating it if needed. `None` fields are left as they are.
    pub fn set_metadata(&mut self, metadata: &DocumentMetadata) -> Result<()> {
        let info_id = self.ensure_info_dict()?;
        let info = self
            .document
            .get_dictionary_mut(info_id)
            .map_err(|err| DocMorphError::parse(format!("info dictionary unreadable: {err}")))?;
        for (key, value) in DocumentMetadata::KEYS.iter().zip(metadata.fields()) {
            if let Some(value) = value {
                info.set(key.to_vec(), lopdf::text_string(value));
            }
        }
        Ok(())
    }

    /// Remove the five metadata fields. An info dictionary left empty is
    /// dropped entirely. Returns how many fields were present.
    pub fn strip_metadata(&mut self) -> usize {
        let info_id = match self.document.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(_)) => None,
            _ => return 0,
        };

        let info = match info_id {
            Some(id) => self.document.get_dictionary_mut(id).ok(),
            None => match self.document.trailer.get_mut(b"Info") {
                Ok(Object::Dictionary(dict)) => Some(dict),
                _ => None,
            },
        };
        let Some(info) = info else {
            return 0;
        };

        let mut removed = 0;
        for key in DocumentMetadata::KEYS {
            if info.remove(key).is_some() {
                removed += 1;
            }
        }
        let now_empty = info.is_empty();

        if now_empty {
            self.document.trailer.remove(b"Info");
            if let Some(id) = info_id {
                self.document.objects.remove(&id);
            }
        }

        debug!(removed, "metadata stripped");
        removed
    }

    fn info_dict(&self) -> Option<&Dictionary> {
        match self.document.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.document.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    fn ensure_info_dict(&mut self) -> Result<ObjectId> {
        match self.document.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => return Ok(*id),
            Ok(Object::Dictionary(dict)) => {
                let dict = dict.clone();
                let id = self.document.add_object(Object::Dictionary(dict));
                self.document.trailer.set("Info", Object::Reference(id));
                return Ok(id);
            }
            _ => {}
        }
        let id = self.document.add_object(Object::Dictionary(Dictionary::new()));
        self.document.trailer.set("Info", Object::Reference(id));
        Ok(id)
    }

    // -- Page copying ---------------------------------------------------------

    /// Copy pages (by 0-based index) out of `source`. The returned handles
    /// are inserted with [`DocumentContainer::add_page`]; `source` is never
    /// modified.
    ///
    /// All pages of one call share a single copy of any object they have in
    /// common (fonts, images).
    #[instrument(skip_all, fields(count = indices.len()))]
    pub fn copy_pages(&mut self, source: &DocumentContainer, indices: &[usize]) -> Result<Vec<PageHandle>> {
        let page_ids = indices
            .iter()
            .map(|&index| source.page_id(index))
            .collect::<Result<Vec<_>>>()?;

        let mut copier = ObjectCopier::new(&source.document, &page_ids, &mut self.document);
        let mut handles = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            let page = source.materialised_page(page_id)?;
            handles.push(PageHandle(copier.copy_page(page_id, &page)));
        }

        debug!(copied_objects = copier.copied(), "pages copied");
        Ok(handles)
    }

    /// Append a copied page as the last page of this document.
    pub fn add_page(&mut self, handle: PageHandle) -> Result<()> {
        let pages_id = self.pages_root()?;
        let PageHandle(page_id) = handle;

        let pages_dict = self
            .document
            .get_dictionary_mut(pages_id)
            .map_err(|err| DocMorphError::parse(format!("page tree root unreadable: {err}")))?;
        match pages_dict.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => kids.push(Object::Reference(page_id)),
            _ => pages_dict.set("Kids", Object::Array(vec![Object::Reference(page_id)])),
        }
        let count = pages_dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        pages_dict.set("Count", Object::Integer(count + 1));

        self.page_dict_mut(page_id)?
            .set("Parent", Object::Reference(pages_id));
        Ok(())
    }

    /// Page dictionary of `page_id` with inherited attributes filled in.
    fn materialised_page(&self, page_id: ObjectId) -> Result<Dictionary> {
        let mut page = self
            .document
            .get_dictionary(page_id)
            .map_err(|err| DocMorphError::parse(format!("cannot read page object {page_id:?}: {err}")))?
            .clone();
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Some(value) = self.inherited(page_id, key) {
                    page.set(key.to_vec(), value);
                }
            }
        }
        if !page.has(b"MediaBox") {
            page.set(
                "MediaBox",
                Object::Array(DEFAULT_MEDIA_BOX.iter().map(|&v| Object::Real(v)).collect()),
            );
        }
        Ok(page)
    }

    fn pages_root(&self) -> Result<ObjectId> {
        self.document
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|err| DocMorphError::parse(format!("no usable /Pages root: {err}")))
    }

    // -- Drawing --------------------------------------------------------------

    /// Draw `text` in the standard Helvetica font with its baseline starting
    /// at (`x`, `y`), rotated counter-clockwise by `rotation_degrees`.
    ///
    /// Existing page content is wrapped in a saved graphics state so the
    /// overlay always starts from the default coordinate system.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        index: usize,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        rotation_degrees: f32,
        opacity: f32,
        color: RgbColor,
    ) -> Result<()> {
        let page_id = self.page_id(index)?;
        let font_id = self.overlay_font();
        let (state_name, state_id) = self.overlay_state(opacity);

        self.register_resource(page_id, b"Font", OVERLAY_FONT_NAME, font_id)?;
        self.register_resource(page_id, b"ExtGState", &state_name, state_id)?;

        let encoded = {
            let font = self
                .document
                .get_dictionary(font_id)
                .map_err(|err| DocMorphError::render(format!("overlay font unreadable: {err}")))?;
            let encoding = font
                .get_font_encoding(&self.document)
                .map_err(|err| DocMorphError::render(format!("overlay font has no usable encoding: {err}")))?;
            encode_or_replace(&encoding, text)
        };

        let radians = rotation_degrees.rem_euclid(360.0).to_radians();
        let (sin, cos) = radians.sin_cos();

        let overlay = Content {
            operations: vec![
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(state_name.into_bytes())]),
                Operation::new(
                    "rg",
                    vec![Object::Real(color.r), Object::Real(color.g), Object::Real(color.b)],
                ),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(OVERLAY_FONT_NAME.as_bytes().to_vec()), Object::Real(size)],
                ),
                Operation::new(
                    "Tm",
                    vec![
                        Object::Real(cos),
                        Object::Real(sin),
                        Object::Real(-sin),
                        Object::Real(cos),
                        Object::Real(x),
                        Object::Real(y),
                    ],
                ),
                Operation::new(
                    "Tj",
                    vec![Object::String(encoded, StringFormat::Hexadecimal)],
                ),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        // Leading newline: streams are concatenated as-is when drawn.
        let mut overlay_bytes = b"\n".to_vec();
        overlay_bytes.extend(
            overlay
                .encode()
                .map_err(|err| DocMorphError::render(format!("cannot encode overlay content: {err}")))?,
        );

        let open_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let overlay_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), overlay_bytes));

        let mut contents = vec![Object::Reference(open_id)];
        contents.extend(self.content_ids(page_id).into_iter().map(Object::Reference));
        contents.push(Object::Reference(overlay_id));
        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));

        Ok(())
    }

    fn overlay_font(&mut self) -> ObjectId {
        if let Some(id) = self.overlay_font {
            return id;
        }
        let mut font = Dictionary::new();
        font.set("Type", "Font");
        font.set("Subtype", "Type1");
        font.set("BaseFont", "Helvetica");
        font.set("Encoding", "WinAnsiEncoding");
        let id = self.document.add_object(Object::Dictionary(font));
        self.overlay_font = Some(id);
        id
    }

    /// One ExtGState per distinct opacity, shared by every page.
    fn overlay_state(&mut self, opacity: f32) -> (String, ObjectId) {
        let key = opacity.to_bits();
        if let Some(entry) = self.overlay_states.get(&key) {
            return entry.clone();
        }
        let mut state = Dictionary::new();
        state.set("Type", "ExtGState");
        state.set("ca", Object::Real(opacity));
        state.set("CA", Object::Real(opacity));
        let id = self.document.add_object(Object::Dictionary(state));
        let name = format!("DocMorphGS{}", self.overlay_states.len() + 1);
        self.overlay_states.insert(key, (name.clone(), id));
        (name, id)
    }

    /// Add `name -> id` to the page's `category` resource dictionary. The
    /// page receives its own resource dictionary so siblings sharing an
    /// inherited one are unaffected.
    fn register_resource(&mut self, page_id: ObjectId, category: &[u8], name: &str, id: ObjectId) -> Result<()> {
        let mut resources = self
            .inherited(page_id, b"Resources")
            .and_then(|obj| self.resolve(&obj).as_dict().ok().cloned())
            .unwrap_or_default();
        let mut entries = resources
            .get(category)
            .ok()
            .and_then(|obj| self.resolve(obj).as_dict().ok().cloned())
            .unwrap_or_default();
        entries.set(name.as_bytes().to_vec(), Object::Reference(id));
        resources.set(category.to_vec(), Object::Dictionary(entries));
        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    // -- Helpers --------------------------------------------------------------

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.document
            .get_dictionary_mut(page_id)
            .map_err(|err| DocMorphError::parse(format!("cannot modify page object {page_id:?}: {err}")))
    }

    /// Look `key` up on the page, then on its ancestors.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut current = self.document.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value.clone());
            }
            let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
            current = self.document.get_dictionary(parent).ok()?;
        }
        warn!(?page_id, "page tree deeper than {MAX_TREE_DEPTH}, giving up on inheritance");
        None
    }

    /// Follow a reference one level; anything else is returned as-is.
    pub(crate) fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    fn rectangle(&self, object: &Object) -> Option<[f32; 4]> {
        let Object::Array(values) = self.resolve(object) else {
            return None;
        };
        if values.len() != 4 {
            return None;
        }
        let mut rect = [0.0; 4];
        for (slot, value) in rect.iter_mut().zip(values) {
            *slot = number(self.resolve(value))?;
        }
        Some(rect)
    }

    fn content_ids(&self, page_id: ObjectId) -> Vec<ObjectId> {
        let Ok(page) = self.document.get_dictionary(page_id) else {
            return Vec::new();
        };
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.document.get_object(*id) {
                // A reference to an array of stream references.
                Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
                _ => vec![*id],
            },
            Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Encode `text` in a font's encoding; characters it cannot carry become `?`.
fn encode_or_replace(encoding: &Encoding<'_>, text: &str) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(text.len());
    let mut buffer = [0u8; 4];
    for c in text.chars() {
        let bytes = Document::encode_text(encoding, c.encode_utf8(&mut buffer));
        if bytes.is_empty() {
            encoded.push(b'?');
        } else {
            encoded.extend(bytes);
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{document_with_pages, nested_tree_document, page_texts};

    #[test]
    fn new_container_is_empty_and_serialisable() {
        let mut container = DocumentContainer::new();
        assert_eq!(container.page_count(), 0);
        let bytes = container.to_bytes(&SerializeOptions::default()).unwrap();
        let reparsed = DocumentContainer::from_bytes(&bytes).unwrap();
        assert_eq!(reparsed.page_count(), 0);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = DocumentContainer::from_bytes(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, DocMorphError::Parse(_)));
    }

    #[test]
    fn page_geometry_comes_from_media_box() {
        let container = DocumentContainer::from_bytes(&document_with_pages(2)).unwrap();
        let page = container.page(1).unwrap();
        assert_eq!(page.index, 1);
        assert_eq!((page.width, page.height), (595.0, 842.0));
        assert_eq!(page.rotation, 0);
        assert_eq!(page.content_ids.len(), 1);
    }

    #[test]
    fn out_of_range_page_is_parse_error() {
        let container = DocumentContainer::from_bytes(&document_with_pages(1)).unwrap();
        assert!(matches!(container.page(5), Err(DocMorphError::Parse(_))));
    }

    #[test]
    fn inherited_attributes_are_visible_and_copied() {
        let source = DocumentContainer::from_bytes(&nested_tree_document()).unwrap();
        assert_eq!(source.page_count(), 2);
        let page = source.page(0).unwrap();
        assert_eq!((page.width, page.height), (300.0, 400.0));
        assert_eq!(page.rotation, 90);

        let mut target = DocumentContainer::new();
        for handle in target.copy_pages(&source, &[1]).unwrap() {
            target.add_page(handle).unwrap();
        }
        let copied = target.page(0).unwrap();
        assert_eq!((copied.width, copied.height), (300.0, 400.0));
        assert_eq!(copied.rotation, 90);
        assert_eq!(
            target.page_fingerprint(0).unwrap(),
            source.page_fingerprint(1).unwrap()
        );
    }

    #[test]
    fn copying_leaves_source_untouched() {
        let bytes = document_with_pages(3);
        let source = DocumentContainer::from_bytes(&bytes).unwrap();
        let before: Vec<_> = (0..3).map(|i| source.page_fingerprint(i).unwrap()).collect();

        let mut target = DocumentContainer::new();
        let handles = target.copy_pages(&source, &[2, 0]).unwrap();
        for handle in handles {
            target.add_page(handle).unwrap();
        }

        let after: Vec<_> = (0..3).map(|i| source.page_fingerprint(i).unwrap()).collect();
        assert_eq!(before, after);
        assert_eq!(source.page_count(), 3);
        assert_eq!(target.page_count(), 2);
        assert_eq!(target.page_fingerprint(0).unwrap(), before[2]);
        assert_eq!(target.page_fingerprint(1).unwrap(), before[0]);
    }

    #[test]
    fn rotation_is_normalised_on_write() {
        let mut container = DocumentContainer::from_bytes(&document_with_pages(1)).unwrap();
        container.set_rotation(0, -90).unwrap();
        assert_eq!(container.page(0).unwrap().rotation, 270);
        container.set_rotation(0, 450).unwrap();
        assert_eq!(container.page(0).unwrap().rotation, 90);
    }

    #[test]
    fn metadata_round_trips_and_strips() {
        let mut container = DocumentContainer::from_bytes(&document_with_pages(1)).unwrap();
        container
            .set_metadata(&DocumentMetadata {
                title: Some("Quarterly report".into()),
                producer: Some("Acme Writer".into()),
                ..Default::default()
            })
            .unwrap();
        let bytes = container.to_bytes(&SerializeOptions::default()).unwrap();

        let mut reparsed = DocumentContainer::from_bytes(&bytes).unwrap();
        let metadata = reparsed.metadata();
        assert_eq!(metadata.title.as_deref(), Some("Quarterly report"));
        assert_eq!(metadata.producer.as_deref(), Some("Acme Writer"));

        assert_eq!(reparsed.strip_metadata(), 2);
        assert!(reparsed.metadata().is_empty());
    }

    #[test]
    fn draw_text_appends_overlay_and_keeps_original() {
        let mut container = DocumentContainer::from_bytes(&document_with_pages(1)).unwrap();
        let original = container.page_content(0).unwrap();
        container
            .draw_text(0, "DRAFT", 100.0, 200.0, 40.0, 45.0, 0.5, RgbColor::watermark_grey())
            .unwrap();

        let bytes = container.to_bytes(&SerializeOptions::default()).unwrap();
        let reparsed = DocumentContainer::from_bytes(&bytes).unwrap();
        let content = reparsed.page_content(0).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(content.windows(original.len()).any(|w| w == original.as_slice()));
        assert!(text.contains("/DocMorphF1"));
        assert!(text.contains("/DocMorphGS1"));
        assert_eq!(page_texts(&reparsed, 0).last().map(String::as_str), Some("DRAFT"));
    }

    /// Non-ASCII values survive a write, serialise and reparse cycle.
    #[test]
    fn non_ascii_metadata_round_trips() {
        let mut container = DocumentContainer::from_bytes(&document_with_pages(1)).unwrap();
        container
            .set_metadata(&DocumentMetadata {
                title: Some("Café Straße".into()),
                keywords: Some("日本語, résumé".into()),
                ..Default::default()
            })
            .unwrap();
        let bytes = container.to_bytes(&SerializeOptions::default()).unwrap();

        let metadata = DocumentContainer::from_bytes(&bytes).unwrap().metadata();
        assert_eq!(metadata.title.as_deref(), Some("Café Straße"));
        assert_eq!(metadata.keywords.as_deref(), Some("日本語, résumé"));
    }

    /// WinAnsi code points in 0x80..0x9F are used, not replaced.
    #[test]
    fn overlay_text_uses_win_ansi_table() {
        let mut container = DocumentContainer::new();
        let font_id = container.overlay_font();
        let font = container.document.get_dictionary(font_id).unwrap();
        let encoding = font.get_font_encoding(&container.document).unwrap();
        assert_eq!(
            encode_or_replace(&encoding, "€5 – “ok”…"),
            vec![0x80, b'5', b' ', 0x96, b' ', 0x93, b'o', b'k', 0x94, 0x85]
        );
        assert_eq!(encode_or_replace(&encoding, "Café ✓"), vec![b'C', b'a', b'f', 0xE9, b' ', b'?']);
    }
}
