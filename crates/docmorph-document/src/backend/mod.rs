// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend adapters: the traits operations call through, plus the built-in
// content-stream text extraction, HTTP fetching and optional pdfium
// rasterization.

pub mod encode;
pub mod extract;
pub mod http;
#[cfg(feature = "pdfium")]
pub mod pdfium;
#[cfg(any(test, feature = "test-util"))]
pub mod stub;
pub mod surface;
pub mod traits;

pub use encode::encode_image;
pub use extract::ContentStreamExtractor;
pub use http::HttpFetcher;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;
pub use surface::SurfaceGuard;
pub use traits::{
    MarkupRenderer, PageFetcher, PageView, RasterSession, Rasterizer, RenderSurface, TextExtractor,
    TextRun,
};
