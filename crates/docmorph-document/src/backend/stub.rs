// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process backends for tests and dry runs. None of them draw real
// content.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docmorph_core::error::{DocMorphError, Result};
use image::{Rgba, RgbaImage};

use super::traits::{
    MarkupRenderer, PageFetcher, PageView, RasterSession, Rasterizer, RenderSurface, TextExtractor,
    TextRun,
};

fn scaled(points: f32, scale: f32) -> u32 {
    ((points * scale).ceil() as u32).max(1)
}

/// Renders every page as opaque white at the requested scale.
#[derive(Debug, Default)]
pub struct BlankRasterizer {
    calls: AtomicUsize,
    opens: AtomicUsize,
    fail_from: Option<usize>,
}

impl BlankRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with a render error on page `index` and every page after it.
    pub fn failing_from(index: usize) -> Self {
        Self {
            fail_from: Some(index),
            ..Self::default()
        }
    }

    /// Number of `rasterize_page` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of documents opened so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

struct BlankSession<'a>(&'a BlankRasterizer);

impl RasterSession for BlankSession<'_> {
    fn rasterize(&mut self, view: &PageView<'_>, scale: f32) -> Result<RgbaImage> {
        self.0.rasterize_page(view, scale)
    }
}

impl Rasterizer for BlankRasterizer {
    fn rasterize_page(&self, view: &PageView<'_>, scale: f32) -> Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_from.is_some_and(|from| view.page.index >= from) {
            return Err(DocMorphError::render(format!(
                "stub failure on page {}",
                view.page.index + 1
            )));
        }
        Ok(RgbaImage::from_pixel(
            scaled(view.page.width, scale),
            scaled(view.page.height, scale),
            Rgba([255, 255, 255, 255]),
        ))
    }

    fn open<'a>(&'a self, _source: &'a [u8]) -> Result<Box<dyn RasterSession + 'a>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(BlankSession(self)))
    }
}

/// Extractor that always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingExtractor;

impl TextExtractor for FailingExtractor {
    fn extract_text_runs(&self, view: &PageView<'_>) -> Result<Vec<TextRun>> {
        Err(DocMorphError::render(format!(
            "no text layer for page {}",
            view.page.index + 1
        )))
    }
}

/// Surface filled with a flat colour.
pub struct StubSurface {
    width: u32,
    height: u32,
    releases: Arc<AtomicUsize>,
}

impl RenderSurface for StubSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn snapshot(&self, scale: f32) -> Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(
            scaled(self.width as f32, scale),
            scaled(self.height as f32, scale),
            Rgba([240, 240, 240, 255]),
        ))
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Produces surfaces of a fixed content height and counts how many were
/// released.
#[derive(Debug, Clone)]
pub struct StubRenderer {
    content_height: u32,
    releases: Arc<AtomicUsize>,
    fail: bool,
}

impl StubRenderer {
    pub fn new(content_height: u32) -> Self {
        Self {
            content_height,
            releases: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0)
        }
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl MarkupRenderer for StubRenderer {
    fn render_markup(&self, markup: &str, width: u32) -> Result<Box<dyn RenderSurface>> {
        if self.fail || markup.trim().is_empty() {
            return Err(DocMorphError::render("stub renderer refused the markup"));
        }
        Ok(Box::new(StubSurface {
            width,
            height: self.content_height,
            releases: Arc::clone(&self.releases),
        }))
    }
}

/// Fetcher that waits `delay` and then renders a fixed document.
#[derive(Debug, Clone)]
pub struct StubFetcher {
    pub renderer: StubRenderer,
    pub delay: Duration,
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_page(&self, url: &str, width: u32, _timeout: Duration) -> Result<Box<dyn RenderSurface>> {
        tokio::time::sleep(self.delay).await;
        self.renderer.render_markup(&format!("<html><!-- {url} --></html>"), width)
    }
}
