// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image page writer — build a PDF whose pages are raster tiles, using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use docmorph_core::error::{DocMorphError, Result};
use image::RgbaImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::backend::encode::flatten_on_white;

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Places raster tiles on fixed-size pages, one tile per page, each scaled
/// to the full page width and anchored to the top edge.
pub struct ImagePdfWriter {
    page_width_pt: f32,
    page_height_pt: f32,
    title: String,
}

impl ImagePdfWriter {
    pub fn new(page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            page_width_pt,
            page_height_pt,
            title: "DocMorph capture".into(),
        }
    }

    /// Tile height in pixels such that a tile `image_width` wide fills one
    /// page exactly.
    pub fn tile_height_px(&self, image_width: u32) -> u32 {
        let ratio = self.page_height_pt / self.page_width_pt;
        ((image_width as f32 * ratio).floor() as u32).max(1)
    }

    /// Build the document from `tiles`, in order.
    #[instrument(skip_all, fields(tiles = tiles.len()))]
    pub fn create_from_tiles(&self, tiles: &[RgbaImage]) -> Result<Vec<u8>> {
        if tiles.is_empty() {
            return Err(DocMorphError::render("no image tiles to place"));
        }

        info!(
            page_w_pt = self.page_width_pt,
            page_h_pt = self.page_height_pt,
            "Creating image PDF"
        );

        let page_w = Mm(self.page_width_pt * MM_PER_PT);
        let page_h = Mm(self.page_height_pt * MM_PER_PT);

        let mut doc = PdfDocument::new(&self.title);
        let mut pages = Vec::with_capacity(tiles.len());

        for tile in tiles {
            let (width, height) = tile.dimensions();
            if width == 0 || height == 0 {
                warn!("skipping empty tile");
                continue;
            }

            let rgb = flatten_on_white(tile);
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // Choose the DPI at which the tile is exactly one page wide.
            let dpi = width as f32 * 72.0 / self.page_width_pt;
            let rendered_h_pt = height as f32 * 72.0 / dpi;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt((self.page_height_pt - rendered_h_pt).max(0.0))),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(dpi),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        if pages.is_empty() {
            return Err(DocMorphError::render("every image tile was empty"));
        }
        let page_count = pages.len();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        debug!(page_count, warnings = warnings.len(), bytes = output.len(), "Image PDF ready");
        Ok(output)
    }
}
