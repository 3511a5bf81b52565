// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits for the external rendering, extraction, and fetching
// backends. Operations only ever see these traits.

use std::time::Duration;

use async_trait::async_trait;
use docmorph_core::error::Result;
use image::RgbaImage;
use serde::Serialize;

use crate::pdf::{DocumentContainer, Page};

/// A page as handed to a backend: the geometry snapshot plus access to the
/// document it belongs to (both parsed and as the original bytes).
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    pub source: &'a [u8],
    pub container: &'a DocumentContainer,
    pub page: &'a Page,
}

/// One positioned run of text in page space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    /// Baseline of the run.
    pub y: f32,
    pub font_size: f32,
}

/// Turns pages and surfaces into pixels.
///
/// Need not be thread-safe; an operation drives its rasterizer from one task.
pub trait Rasterizer {
    /// Render one page at `scale` times its size in points.
    fn rasterize_page(&self, page: &PageView<'_>, scale: f32) -> Result<RgbaImage>;

    /// Open `source` for a run of page renders. Backends that parse the
    /// document themselves override this to parse it once; the default
    /// renders each page through [`Rasterizer::rasterize_page`].
    fn open<'a>(&'a self, source: &'a [u8]) -> Result<Box<dyn RasterSession + 'a>> {
        let _ = source;
        Ok(Box::new(PageByPage(self)))
    }

    /// Render a materialised markup surface.
    fn rasterize_surface(&self, surface: &dyn RenderSurface, scale: f32) -> Result<RgbaImage> {
        surface.snapshot(scale)
    }
}

/// One document opened by a [`Rasterizer`].
pub trait RasterSession {
    fn rasterize(&mut self, page: &PageView<'_>, scale: f32) -> Result<RgbaImage>;
}

struct PageByPage<'a, R: ?Sized>(&'a R);

impl<R: Rasterizer + ?Sized> RasterSession for PageByPage<'_, R> {
    fn rasterize(&mut self, page: &PageView<'_>, scale: f32) -> Result<RgbaImage> {
        self.0.rasterize_page(page, scale)
    }
}

pub trait TextExtractor: Send + Sync {
    /// Text runs of a page in content-stream order.
    fn extract_text_runs(&self, page: &PageView<'_>) -> Result<Vec<TextRun>>;
}

/// An off-screen rendering surface. Must be released exactly once; hold it
/// in a [`SurfaceGuard`](super::SurfaceGuard).
pub trait RenderSurface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn snapshot(&self, scale: f32) -> Result<RgbaImage>;
    fn release(&mut self);
}

pub trait MarkupRenderer: Send + Sync {
    /// Lay `markup` out at `width` CSS pixels; the height follows the content.
    fn render_markup(&self, markup: &str, width: u32) -> Result<Box<dyn RenderSurface>>;
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url` into a surface `width` pixels wide, giving up after
    /// `timeout`.
    async fn fetch_page(&self, url: &str, width: u32, timeout: Duration) -> Result<Box<dyn RenderSurface>>;
}
