// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use docmorph_core::WatermarkSpec;
use docmorph_core::error::Result;
use docmorph_core::progress::{ProgressReporter, ProgressSink};
use tokio::task::yield_now;
use tracing::{debug, info, instrument};

use crate::pdf::{DocumentContainer, SerializeOptions};

/// Draw `spec.text` on every page, starting at the spec's anchor point.
#[instrument(skip_all, fields(bytes_len = input.len(), anchor = ?spec.anchor))]
pub async fn watermark(input: &[u8], spec: &WatermarkSpec, progress: &mut dyn ProgressSink) -> Result<Vec<u8>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = run(input, spec, &mut reporter).await;
    reporter.conclude(result)
}

async fn run(input: &[u8], spec: &WatermarkSpec, reporter: &mut ProgressReporter<'_>) -> Result<Vec<u8>> {
    spec.validate()?;

    reporter.report(10, "Loading PDF...");
    yield_now().await;
    let mut container = DocumentContainer::from_bytes(input)?;
    let page_count = container.page_count();

    reporter.report(50, "Adding watermark...");
    let rotation = spec.normalized_rotation();

    for index in 0..page_count {
        reporter.step(50, 90, index, page_count, format!("Processing page {}...", index + 1));

        let page = container.page(index)?;
        let (x, y) = spec.anchor.point(page.width, page.height);
        let (x, y) = (x + page.origin.0, y + page.origin.1);
        container.draw_text(index, &spec.text, x, y, spec.font_size, rotation, spec.opacity, spec.color)?;

        debug!(page = index + 1, x, y, "watermark drawn");
        yield_now().await;
    }

    reporter.report(90, "Saving watermarked PDF...");
    yield_now().await;
    let output = container.to_bytes(&SerializeOptions::default())?;

    info!(page_count, "watermark complete");
    reporter.finish("Watermark added!");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::extract::runs_from_content;
    use crate::testing::document_with_pages;
    use docmorph_core::{Anchor, ErrorKind, RecordingSink};

    #[tokio::test]
    async fn every_page_gets_the_text() {
        let input = document_with_pages(3);
        let mut sink = RecordingSink::new();
        let spec = WatermarkSpec::new("CONFIDENTIAL");
        let output = watermark(&input, &spec, &mut sink).await.unwrap();

        let container = DocumentContainer::from_bytes(&output).unwrap();
        assert_eq!(container.page_count(), 3);
        for index in 0..3 {
            let runs = runs_from_content(&container.page_content(index).unwrap()).unwrap();
            let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
            assert_eq!(texts, vec![format!("Page {}", index + 1).as_str(), "CONFIDENTIAL"]);
            let mark = runs.last().unwrap();
            assert!((mark.x - 297.5).abs() < 0.01 && (mark.y - 421.0).abs() < 0.01);
        }

        assert_eq!(sink.percents(), vec![10, 50, 50, 63, 77, 90, 100]);
        assert_eq!(sink.last().unwrap().status, "Watermark added!");
    }

    #[tokio::test]
    async fn corner_anchor_uses_fixed_margin() {
        let input = document_with_pages(1);
        let spec = WatermarkSpec::new("draft")
            .with_anchor(Anchor::TopRight)
            .with_rotation(-315.0);
        let output = watermark(&input, &spec, &mut RecordingSink::new()).await.unwrap();

        let container = DocumentContainer::from_bytes(&output).unwrap();
        let runs = runs_from_content(&container.page_content(0).unwrap()).unwrap();
        let mark = runs.last().unwrap();
        assert!((mark.x - 545.0).abs() < 0.01);
        assert!((mark.y - 792.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn invalid_opacity_is_rejected_before_parsing() {
        let spec = WatermarkSpec::new("x").with_opacity(0.05);
        let mut sink = RecordingSink::new();
        let err = watermark(b"not even a pdf", &spec, &mut sink).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn unreadable_input_is_parse_error() {
        let spec = WatermarkSpec::new("x");
        let err = watermark(b"garbage", &spec, &mut RecordingSink::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
