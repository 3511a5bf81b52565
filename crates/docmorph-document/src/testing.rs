// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory fixture documents for tests and benches.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::backend::extract::page_runs;
use crate::pdf::DocumentContainer;

fn text_content(text: &str) -> Vec<u8> {
    let escaped = text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)");
    format!("BT /F1 24 Tf 72 720 Td ({escaped}) Tj ET").into_bytes()
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture document serialises");
    bytes
}

/// Shared skeleton: returns the document, the Pages id and the font id.
fn skeleton() -> (Document, ObjectId, ObjectId) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    (doc, pages_id, font_id)
}

fn finish(mut doc: Document, pages_id: ObjectId, pages: Object) -> Vec<u8> {
    doc.objects.insert(pages_id, pages);
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    save(doc)
}

/// A4-sized pages, one line of text each.
pub fn document_with_texts(texts: &[&str]) -> Vec<u8> {
    let (mut doc, pages_id, font_id) = skeleton();

    let kids: Vec<Object> = texts
        .iter()
        .map(|text| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, text_content(text)));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            });
            Object::Reference(page_id)
        })
        .collect();

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    finish(doc, pages_id, Object::Dictionary(pages))
}

/// `count` pages reading "Page 1", "Page 2", ...
pub fn document_with_pages(count: usize) -> Vec<u8> {
    let texts: Vec<String> = (1..=count).map(|n| format!("Page {n}")).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    document_with_texts(&refs)
}

/// Two pages whose MediaBox, Rotate and Resources are inherited from an
/// intermediate page-tree node.
pub fn nested_tree_document() -> Vec<u8> {
    let (mut doc, root_id, font_id) = skeleton();
    let middle_id = doc.new_object_id();

    let kids: Vec<Object> = ["Inherited A", "Inherited B"]
        .iter()
        .map(|text| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, text_content(text)));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => middle_id,
                "Contents" => content_id,
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        middle_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Kids" => kids,
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
            "Rotate" => 90,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        }),
    );

    let root = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(middle_id)],
        "Count" => 2,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    finish(doc, root_id, Object::Dictionary(root))
}

/// Two pages; the first carries a text annotation pointing back at its page
/// and a link whose destination is the second page.
pub fn annotated_document() -> Vec<u8> {
    let (mut doc, pages_id, font_id) = skeleton();
    let first_id = doc.new_object_id();
    let second_id = doc.new_object_id();

    let note_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Text",
        "Rect" => vec![10.into(), 10.into(), 30.into(), 30.into()],
        "Contents" => Object::string_literal("reviewer note"),
        "P" => first_id,
    });
    let link_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![40.into(), 10.into(), 90.into(), 30.into()],
        "Dest" => vec![Object::Reference(second_id), "Fit".into()],
    });

    for (page_id, text, annots) in [
        (first_id, "Annotated", vec![Object::Reference(note_id), Object::Reference(link_id)]),
        (second_id, "Target", Vec::new()),
    ] {
        let content_id = doc.add_object(Stream::new(dictionary! {}, text_content(text)));
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "Annots" => annots,
            }),
        );
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(first_id), Object::Reference(second_id)],
        "Count" => 2,
    };
    finish(doc, pages_id, Object::Dictionary(pages))
}

/// Single page with all five metadata fields filled in.
pub fn document_with_metadata() -> Vec<u8> {
    let mut doc = Document::load_mem(&document_with_pages(1)).expect("fixture reloads");
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Secret plans"),
        "Subject" => Object::string_literal("Plans"),
        "Keywords" => Object::string_literal("world, domination"),
        "Producer" => Object::string_literal("Acme PDF 9"),
        "Creator" => Object::string_literal("Acme Writer"),
    });
    doc.trailer.set("Info", info_id);
    save(doc)
}

/// One page showing "Hi" through a Type0 font: two-byte Identity-H codes
/// that only the font's ToUnicode map can translate.
pub fn type0_document() -> Vec<u8> {
    let (mut doc, pages_id, _) = skeleton();
    let cmap_id = doc.add_object(Stream::new(
        dictionary! {},
        b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0001> <0048>
<0002> <0069>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end"
        .to_vec(),
    ));
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "NotoSans-Regular",
        "Encoding" => "Identity-H",
        "ToUnicode" => cmap_id,
    });
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 72 720 Td <00010002> Tj ET".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
    };
    finish(doc, pages_id, Object::Dictionary(pages))
}

/// Text of each `Tj`/`TJ` run on a page, in stream order.
pub fn page_texts(container: &DocumentContainer, index: usize) -> Vec<String> {
    page_runs(container, index)
        .expect("fixture content decodes")
        .into_iter()
        .map(|run| run.text)
        .collect()
}
