// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Whole-pipeline checks: operation, then packaging, as a front end drives
// them.

use std::io::Cursor;

use docmorph_core::config::RasterConfig;
use docmorph_core::{ImageFormat, Operation, ProgressEvent, RecordingSink, SplitMode, WatermarkSpec};
use docmorph_document::backend::stub::BlankRasterizer;
use docmorph_document::testing::{document_with_pages, document_with_texts};
use docmorph_document::{
    DocumentContainer, MemorySink, OperationResult, OutputNaming, OutputPackager, compress, export_images,
    merge, rotate, split, watermark,
};

fn page_count(bytes: &[u8]) -> usize {
    DocumentContainer::from_bytes(bytes).unwrap().page_count()
}

fn assert_monotonic(events: &[ProgressEvent]) {
    assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(events.last().map(|e| e.percent), Some(100));
}

/// Two one-page documents merge into one two-page document.
#[tokio::test]
async fn merging_two_single_pages() {
    let a = document_with_texts(&["first"]);
    let b = document_with_texts(&["second"]);
    let mut sink = RecordingSink::new();
    let merged = merge(&[&a, &b], &mut sink).await.unwrap();
    assert_eq!(page_count(&merged), 2);
    assert_monotonic(&sink.events);

    let mut out = MemorySink::default();
    let name = OutputPackager::deliver(
        OperationResult::Single(merged),
        &OutputNaming::new(Operation::Merge, Some("first.pdf")),
        &mut out,
    )
    .unwrap();
    assert_eq!(name, "merged.pdf");
}

/// Seven pages, three per file: parts of 3, 3 and 1 pages in one archive.
#[tokio::test]
async fn splitting_seven_pages_by_three() {
    let input = document_with_pages(7);
    let mut sink = RecordingSink::new();
    let parts = split(&input, &SplitMode::ByPageCount(3), &mut sink).await.unwrap();
    let counts: Vec<usize> = parts.iter().map(|p| page_count(p)).collect();
    assert_eq!(counts, vec![3, 3, 1]);
    assert_monotonic(&sink.events);

    let mut out = MemorySink::default();
    let name = OutputPackager::deliver(
        OperationResult::Many(parts),
        &OutputNaming::new(Operation::Split, Some("handbook.pdf")),
        &mut out,
    )
    .unwrap();
    assert_eq!(name, "handbook_split.zip");
    let archive = zip::ZipArchive::new(Cursor::new(out.files[0].1.clone())).unwrap();
    assert_eq!(archive.len(), 3);
}

/// Every page's stored rotation becomes (original + 90) mod 360.
#[tokio::test]
async fn rotating_by_ninety() {
    let input = document_with_pages(3);
    let once = rotate(&input, 90, None, &mut RecordingSink::new()).await.unwrap();
    let twice = rotate(&once, 90, None, &mut RecordingSink::new()).await.unwrap();
    let before = DocumentContainer::from_bytes(&once).unwrap().pages().unwrap();
    let after = DocumentContainer::from_bytes(&twice).unwrap().pages().unwrap();
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(a.rotation, (b.rotation + 90) % 360);
    }
}

/// A three-page export yields three decodable images of the requested
/// format.
#[tokio::test]
async fn exporting_three_pages_to_jpeg() {
    let input = document_with_pages(3);
    let mut sink = RecordingSink::new();
    let images = export_images(
        &input,
        ImageFormat::Jpeg,
        &BlankRasterizer::new(),
        &RasterConfig::default(),
        &mut sink,
    )
    .await
    .unwrap();
    assert_eq!(images.len(), 3);
    for blob in &images {
        assert_eq!(image::guess_format(blob).unwrap(), image::ImageFormat::Jpeg);
    }
    assert_monotonic(&sink.events);
}

/// Watermark, then compress: the page count survives both.
#[tokio::test]
async fn chained_operations_keep_pages() {
    let input = document_with_pages(5);
    let marked = watermark(&input, &WatermarkSpec::new("DRAFT"), &mut RecordingSink::new())
        .await
        .unwrap();
    let packed = compress(&marked, Default::default(), &mut RecordingSink::new())
        .await
        .unwrap();
    assert_eq!(page_count(&packed), 5);
}
