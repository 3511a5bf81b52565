// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Web capture: markup or a URL, rendered once and cut into page-sized
// image tiles.

use docmorph_core::config::CaptureConfig;
use docmorph_core::error::{DocMorphError, Result};
use docmorph_core::progress::{ProgressReporter, ProgressSink};
use image::RgbaImage;
use image::imageops::crop_imm;
use tokio::task::yield_now;
use tracing::{debug, info, instrument};

use crate::backend::http::parse_capture_url;
use crate::backend::{MarkupRenderer, PageFetcher, Rasterizer, RenderSurface, SurfaceGuard};
use crate::pdf::ImagePdfWriter;

/// Render `markup` at the configured surface width and paginate it.
#[instrument(skip_all, fields(markup_len = markup.len()))]
pub async fn capture_markup(
    markup: &str,
    renderer: &dyn MarkupRenderer,
    rasterizer: &dyn Rasterizer,
    config: &CaptureConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<u8>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = async {
        if markup.trim().is_empty() {
            return Err(DocMorphError::validation("no markup to capture"));
        }
        reporter.report(10, "Preparing capture...");
        yield_now().await;
        let surface = renderer.render_markup(markup, config.surface_width)?;
        paginate(surface, rasterizer, config, &mut reporter).await
    }
    .await;
    reporter.conclude(result)
}

/// Load `url` through `fetcher` under the configured load timeout and
/// paginate the result.
#[instrument(skip_all, fields(url = %url))]
pub async fn capture_url(
    url: &str,
    fetcher: &dyn PageFetcher,
    rasterizer: &dyn Rasterizer,
    config: &CaptureConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<u8>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = async {
        parse_capture_url(url)?;
        reporter.report(10, "Loading webpage...");

        let deadline = config.load_timeout();
        let surface = tokio::time::timeout(deadline, fetcher.fetch_page(url, config.surface_width, deadline))
            .await
            .map_err(|_| DocMorphError::timeout(format!("{url} did not finish loading within {deadline:?}")))??;
        paginate(surface, rasterizer, config, &mut reporter).await
    }
    .await;
    reporter.conclude(result)
}

async fn paginate(
    surface: Box<dyn RenderSurface>,
    rasterizer: &dyn Rasterizer,
    config: &CaptureConfig,
    reporter: &mut ProgressReporter<'_>,
) -> Result<Vec<u8>> {
    let guard = SurfaceGuard::new(surface);
    debug!(
        width = guard.surface().width(),
        height = guard.surface().height(),
        "surface ready"
    );

    reporter.report(40, "Rendering page...");
    yield_now().await;
    let image = rasterizer.rasterize_surface(guard.surface(), config.scale)?;
    drop(guard);

    reporter.report(70, "Generating PDF...");
    yield_now().await;
    let writer = ImagePdfWriter::new(config.page_width_pt, config.page_height_pt);
    let tiles = tile(&image, writer.tile_height_px(image.width()));

    reporter.report(90, "Finalizing...");
    yield_now().await;
    let pdf = writer.create_from_tiles(&tiles)?;

    info!(pages = tiles.len(), bytes = pdf.len(), "capture complete");
    reporter.finish("Capture complete!");
    Ok(pdf)
}

/// Cut `image` top to bottom into slices of `tile_height` (the last may be
/// shorter).
fn tile(image: &RgbaImage, tile_height: u32) -> Vec<RgbaImage> {
    let (width, height) = image.dimensions();
    let tile_height = tile_height.max(1);
    (0..height)
        .step_by(tile_height as usize)
        .map(|top| crop_imm(image, 0, top, width, tile_height.min(height - top)).to_image())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::{BlankRasterizer, StubFetcher, StubRenderer};
    use crate::backend::PageView;
    use crate::pdf::DocumentContainer;
    use docmorph_core::{ErrorKind, RecordingSink};
    use std::time::Duration;

    struct BrokenRasterizer;

    impl Rasterizer for BrokenRasterizer {
        fn rasterize_page(&self, _view: &PageView<'_>, _scale: f32) -> Result<RgbaImage> {
            Err(DocMorphError::render("broken"))
        }

        fn rasterize_surface(&self, _surface: &dyn RenderSurface, _scale: f32) -> Result<RgbaImage> {
            Err(DocMorphError::render("broken"))
        }
    }

    #[test]
    fn tiles_cover_the_image() {
        let image = RgbaImage::new(10, 25);
        let heights: Vec<u32> = tile(&image, 10).iter().map(|t| t.height()).collect();
        assert_eq!(heights, vec![10, 10, 5]);
    }

    /// 794 px wide at scale 2 is 1588 px, so a 2245-px page tile. Content
    /// 1200 CSS px tall renders 2400 px: two pages.
    #[tokio::test]
    async fn tall_markup_spans_pages() {
        let renderer = StubRenderer::new(1200);
        let mut sink = RecordingSink::new();
        let pdf = capture_markup(
            "<h1>Report</h1>",
            &renderer,
            &BlankRasterizer::new(),
            &CaptureConfig::default(),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(DocumentContainer::from_bytes(&pdf).unwrap().page_count(), 2);
        assert_eq!(sink.percents(), vec![10, 40, 70, 90, 100]);
        assert_eq!(renderer.releases(), 1);
    }

    #[tokio::test]
    async fn surface_is_released_when_rasterizing_fails() {
        let renderer = StubRenderer::new(300);
        let err = capture_markup(
            "<p>x</p>",
            &renderer,
            &BrokenRasterizer,
            &CaptureConfig::default(),
            &mut RecordingSink::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
        assert_eq!(renderer.releases(), 1);
    }

    #[tokio::test]
    async fn renderer_failure_is_render_error() {
        let err = capture_markup(
            "<p>x</p>",
            &StubRenderer::failing(),
            &BlankRasterizer::new(),
            &CaptureConfig::default(),
            &mut RecordingSink::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
    }

    #[tokio::test]
    async fn slow_load_times_out() {
        let fetcher = StubFetcher {
            renderer: StubRenderer::new(100),
            delay: Duration::from_millis(500),
        };
        let config = CaptureConfig {
            load_timeout_ms: 20,
            ..CaptureConfig::default()
        };
        let mut sink = RecordingSink::new();
        let err = capture_url("https://example.com", &fetcher, &BlankRasterizer::new(), &config, &mut sink)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(fetcher.renderer.releases(), 0);
        assert!(sink.last().unwrap().error.is_some());
    }

    #[tokio::test]
    async fn fetched_page_is_captured() {
        let fetcher = StubFetcher {
            renderer: StubRenderer::new(100),
            delay: Duration::from_millis(1),
        };
        let pdf = capture_url(
            "https://example.com",
            &fetcher,
            &BlankRasterizer::new(),
            &CaptureConfig::default(),
            &mut RecordingSink::new(),
        )
        .await
        .unwrap();
        assert_eq!(DocumentContainer::from_bytes(&pdf).unwrap().page_count(), 1);
        assert_eq!(fetcher.renderer.releases(), 1);
    }

    #[tokio::test]
    async fn non_http_url_is_rejected() {
        let fetcher = StubFetcher {
            renderer: StubRenderer::new(100),
            delay: Duration::ZERO,
        };
        let err = capture_url(
            "ftp://example.com",
            &fetcher,
            &BlankRasterizer::new(),
            &CaptureConfig::default(),
            &mut RecordingSink::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
