// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use docmorph_core::ImageFormat;
use docmorph_core::config::RasterConfig;
use docmorph_core::error::Result;
use docmorph_core::progress::{ProgressReporter, ProgressSink};
use tokio::task::yield_now;
use tracing::{debug, info, instrument};

use crate::backend::{PageView, Rasterizer, encode_image};
use crate::pdf::DocumentContainer;

/// Rasterize every page and encode it as `format`, one blob per page.
///
/// The first page that fails to render aborts the export.
#[instrument(skip_all, fields(bytes_len = input.len(), format = ?format))]
pub async fn export_images(
    input: &[u8],
    format: ImageFormat,
    rasterizer: &dyn Rasterizer,
    config: &RasterConfig,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<Vec<u8>>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = run(input, format, rasterizer, config, &mut reporter).await;
    reporter.conclude(result)
}

async fn run(
    input: &[u8],
    format: ImageFormat,
    rasterizer: &dyn Rasterizer,
    config: &RasterConfig,
    reporter: &mut ProgressReporter<'_>,
) -> Result<Vec<Vec<u8>>> {
    reporter.report(10, "Loading PDF...");
    yield_now().await;
    let container = DocumentContainer::from_bytes(input)?;
    let pages = container.pages()?;
    let total = pages.len();
    let mut session = rasterizer.open(input)?;

    let mut images = Vec::with_capacity(total);
    for page in &pages {
        reporter.step(30, 90, page.index, total, format!("Converting page {} of {total}...", page.index + 1));

        let view = PageView {
            source: input,
            container: &container,
            page,
        };
        let pixels = session.rasterize(&view, config.scale)?;
        let encoded = encode_image(&pixels, format, config.jpeg_quality)?;
        debug!(
            page = page.index + 1,
            width = pixels.width(),
            height = pixels.height(),
            bytes = encoded.len(),
            "page exported"
        );
        images.push(encoded);
        yield_now().await;
    }

    info!(pages = images.len(), "image export complete");
    reporter.finish("Conversion complete!");
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::BlankRasterizer;
    use crate::testing::document_with_pages;
    use docmorph_core::{ErrorKind, RecordingSink};

    /// A4 at scale 2 renders to 1190 x 1684 pixels per page.
    #[tokio::test]
    async fn one_png_per_page_at_configured_scale() {
        let input = document_with_pages(2);
        let rasterizer = BlankRasterizer::new();
        let mut sink = RecordingSink::new();
        let images = export_images(&input, ImageFormat::Png, &rasterizer, &RasterConfig::default(), &mut sink)
            .await
            .unwrap();

        assert_eq!(images.len(), 2);
        let decoded = image::load_from_memory(&images[1]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1190, 1684));
        assert_eq!(sink.percents(), vec![10, 30, 60, 100]);
    }

    #[tokio::test]
    async fn jpeg_export_is_jpeg() {
        let input = document_with_pages(1);
        let images = export_images(
            &input,
            ImageFormat::Jpeg,
            &BlankRasterizer::new(),
            &RasterConfig::default(),
            &mut RecordingSink::new(),
        )
        .await
        .unwrap();
        assert_eq!(&images[0][..3], &[0xFF, 0xD8, 0xFF]);
    }

    /// The document is opened once for the whole export, not per page.
    #[tokio::test]
    async fn document_is_opened_once_per_export() {
        let input = document_with_pages(3);
        let rasterizer = BlankRasterizer::new();
        export_images(&input, ImageFormat::Png, &rasterizer, &RasterConfig::default(), &mut RecordingSink::new())
            .await
            .unwrap();
        assert_eq!(rasterizer.opens(), 1);
        assert_eq!(rasterizer.calls(), 3);
    }

    /// Rendering stops at the first failing page.
    #[tokio::test]
    async fn render_failure_aborts_remaining_pages() {
        let input = document_with_pages(4);
        let rasterizer = BlankRasterizer::failing_from(1);
        let mut sink = RecordingSink::new();
        let err = export_images(&input, ImageFormat::Png, &rasterizer, &RasterConfig::default(), &mut sink)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Render);
        assert_eq!(rasterizer.calls(), 2);
        assert!(sink.last().unwrap().error.is_some());
    }
}
