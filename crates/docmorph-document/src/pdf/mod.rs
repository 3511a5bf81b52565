// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the page-structured document model and the raster page writer.

pub mod container;
mod copy;
pub mod writer;

pub use container::{DocumentContainer, DocumentMetadata, Page, PageHandle, SerializeOptions};
pub use writer::ImagePdfWriter;
