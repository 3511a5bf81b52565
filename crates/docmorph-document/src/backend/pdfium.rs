// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfium-backed rasterizer (feature `pdfium`).
//
// The library is bound once at construction. A session loads the original
// document bytes once and renders pages from that handle.

use docmorph_core::config::RasterConfig;
use docmorph_core::error::{DocMorphError, Result};
use image::RgbaImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

use super::traits::{PageView, RasterSession, Rasterizer};

pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind pdfium from `config.pdfium_library_path` if set, otherwise from
    /// the system library path.
    pub fn new(config: &RasterConfig) -> Result<Self> {
        let bindings = match &config.pdfium_library_path {
            Some(dir) => {
                let library = Pdfium::pdfium_platform_library_name_at_path(dir);
                debug!(?library, "binding pdfium");
                Pdfium::bind_to_library(&library)
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|err| DocMorphError::render(format!("pdfium library unavailable: {err}")))?;

        info!("pdfium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize_page(&self, view: &PageView<'_>, scale: f32) -> Result<RgbaImage> {
        self.open(view.source)?.rasterize(view, scale)
    }

    fn open<'a>(&'a self, source: &'a [u8]) -> Result<Box<dyn RasterSession + 'a>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(source, None)
            .map_err(|err| DocMorphError::render(format!("pdfium could not open document: {err}")))?;
        debug!(pages = document.pages().len(), "pdfium document opened");
        Ok(Box::new(PdfiumSession { document }))
    }
}

struct PdfiumSession<'a> {
    document: PdfDocument<'a>,
}

impl RasterSession for PdfiumSession<'_> {
    fn rasterize(&mut self, view: &PageView<'_>, scale: f32) -> Result<RgbaImage> {
        let number = view.page.index + 1;
        let index = u16::try_from(view.page.index)
            .map_err(|_| DocMorphError::render(format!("page {number} beyond pdfium's page range")))?;
        let page = self
            .document
            .pages()
            .get(index)
            .map_err(|err| DocMorphError::render(format!("pdfium could not load page {number}: {err}")))?;

        let target_width = ((page.width().value * scale) as i32).max(1);
        let target_height = ((page.height().value * scale) as i32).max(1);
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|err| DocMorphError::render(format!("pdfium failed to render page {number}: {err}")))?;

        debug!(page = number, target_width, target_height, "page rasterized");
        Ok(bitmap.as_image().to_rgba8())
    }
}
