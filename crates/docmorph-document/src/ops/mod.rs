// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transformation operations. Each is an independent async function from
// input bytes and options to output bytes, reporting through a progress
// sink. Pages are processed one at a time and every stage yields.

pub mod capture;
pub mod compress;
pub mod export_image;
pub mod export_office;
pub mod merge;
pub mod rotate;
pub mod split;
pub mod watermark;

use docmorph_core::error::{DocMorphError, Result};

use crate::pdf::DocumentContainer;

pub use capture::{capture_markup, capture_url};
pub use compress::compress;
pub use export_image::export_images;
pub use export_office::export_office;
pub use merge::merge;
pub use rotate::rotate;
pub use split::split;
pub use watermark::watermark;

/// Open the `position`th (1-based) of several inputs, naming it in any
/// parse error.
pub(crate) fn open_input(bytes: &[u8], position: usize) -> Result<DocumentContainer> {
    DocumentContainer::from_bytes(bytes).map_err(|err| tag_input(err, position))
}

/// Prefix an error raised while working on the `position`th input with
/// that position. The error keeps its kind; I/O and serialization errors
/// pass through untouched.
pub(crate) fn tag_input(err: DocMorphError, position: usize) -> DocMorphError {
    let tag = |detail: String| format!("input #{position}: {detail}");
    match err {
        DocMorphError::Validation(detail) => DocMorphError::Validation(tag(detail)),
        DocMorphError::Parse(detail) => DocMorphError::Parse(tag(detail)),
        DocMorphError::Render(detail) => DocMorphError::Render(tag(detail)),
        DocMorphError::Timeout(detail) => DocMorphError::Timeout(tag(detail)),
        DocMorphError::Packaging(detail) => DocMorphError::Packaging(tag(detail)),
        other => other,
    }
}
