// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backends available to this build of the binary.

use docmorph_core::EngineConfig;
use docmorph_core::error::{DocMorphError, Result};
use docmorph_document::backend::{MarkupRenderer, PageView, Rasterizer, RenderSurface};
use image::RgbaImage;

/// Page rasterizer for `to-image`.
#[cfg(feature = "pdfium")]
pub fn page_rasterizer(config: &EngineConfig) -> Result<Box<dyn Rasterizer>> {
    let rasterizer = docmorph_document::backend::PdfiumRasterizer::new(&config.raster)?;
    Ok(Box::new(rasterizer))
}

#[cfg(not(feature = "pdfium"))]
pub fn page_rasterizer(_config: &EngineConfig) -> Result<Box<dyn Rasterizer>> {
    Err(DocMorphError::render(
        "this build has no page renderer; rebuild with the `pdfium` feature",
    ))
}

/// Stands in for a markup engine in builds that ship none.
pub struct NoMarkupRenderer;

impl MarkupRenderer for NoMarkupRenderer {
    fn render_markup(&self, _markup: &str, _width: u32) -> Result<Box<dyn RenderSurface>> {
        Err(DocMorphError::render("this build has no markup renderer"))
    }
}

/// Snapshots capture surfaces; pages are never rasterized through it.
pub struct SurfaceRasterizer;

impl Rasterizer for SurfaceRasterizer {
    fn rasterize_page(&self, page: &PageView<'_>, _scale: f32) -> Result<RgbaImage> {
        Err(DocMorphError::render(format!(
            "page {} cannot be rasterized without a page renderer",
            page.page.index + 1
        )))
    }
}
