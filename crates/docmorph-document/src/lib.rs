// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docmorph-document — Document engine for DocMorph.
//
// Provides the page-structured document container (over lopdf), the
// transformation operations (merge, split, rotate, watermark, compress,
// image and office export, web capture), the backend adapter traits, and
// output packaging.

pub mod backend;
pub mod office;
pub mod ops;
pub mod package;
pub mod pdf;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export the primary entry points so callers can use
// `docmorph_document::merge` etc.
pub use ops::{
    capture_markup, capture_url, compress, export_images, export_office, merge, rotate, split,
    watermark,
};
pub use package::{DirectorySink, DownloadSink, MemorySink, OperationResult, OutputNaming, OutputPackager};
pub use pdf::{DocumentContainer, DocumentMetadata, Page};
