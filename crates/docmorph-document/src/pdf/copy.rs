// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep object copy between two lopdf documents.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::warn;

/// Copies objects reachable from a set of pages into a target document.
///
/// Every source object is copied at most once; cycles (annotation `/P`
/// back-references, shared resources) resolve through the id map. `/Parent`
/// links are dropped and re-established when a page is attached. A
/// reference to a page outside the copied set becomes `null`.
pub(crate) struct ObjectCopier<'s, 't> {
    source: &'s Document,
    target: &'t mut Document,
    mapping: HashMap<ObjectId, ObjectId>,
    reserved: HashMap<ObjectId, ObjectId>,
}

impl<'s, 't> ObjectCopier<'s, 't> {
    pub(crate) fn new(source: &'s Document, pages: &[ObjectId], target: &'t mut Document) -> Self {
        // Reserve target ids up front so references between copied pages
        // resolve to the page objects themselves.
        let reserved: HashMap<ObjectId, ObjectId> = pages
            .iter()
            .map(|&page_id| (page_id, target.new_object_id()))
            .collect();
        Self {
            source,
            target,
            mapping: reserved.clone(),
            reserved,
        }
    }

    /// Number of distinct source objects mapped so far.
    pub(crate) fn copied(&self) -> usize {
        self.mapping.len()
    }

    /// Copy one page given its materialised dictionary. Copying the same
    /// page twice yields two independent page objects; back-references
    /// resolve to the first.
    pub(crate) fn copy_page(&mut self, page_id: ObjectId, page: &Dictionary) -> ObjectId {
        let new_id = self
            .reserved
            .remove(&page_id)
            .unwrap_or_else(|| self.target.new_object_id());
        let copied = self.copy_dictionary(page);
        self.target.objects.insert(new_id, Object::Dictionary(copied));
        new_id
    }

    fn copy_reference(&mut self, id: ObjectId) -> Object {
        if let Some(&mapped) = self.mapping.get(&id) {
            return Object::Reference(mapped);
        }

        let object = match self.source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "dangling reference while copying, replacing with null");
                return Object::Null;
            }
        };
        // Pages in the copied set are already mapped.
        if is_page(object) {
            return Object::Null;
        }

        let new_id = self.target.new_object_id();
        self.mapping.insert(id, new_id);
        let copied = self.copy_object(object);
        self.target.objects.insert(new_id, copied);
        Object::Reference(new_id)
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(*id),
            Object::Array(items) => Object::Array(items.iter().map(|item| self.copy_object(item)).collect()),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Stream(stream) => {
                let mut copied = stream.clone();
                copied.dict = self.copy_dictionary(&stream.dict);
                Object::Stream(copied)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copied.set(key.clone(), self.copy_object(value));
        }
        copied
    }
}

fn is_page(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"Page")
}
