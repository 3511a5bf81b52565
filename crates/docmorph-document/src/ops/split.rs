// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::ops::Range;

use docmorph_core::error::{DocMorphError, Result};
use docmorph_core::progress::{ProgressReporter, ProgressSink};
use docmorph_core::SplitMode;
use tokio::task::yield_now;
use tracing::{debug, info, instrument};

use crate::pdf::{DocumentContainer, SerializeOptions};

/// Split one document into several, either in fixed-size chunks or along
/// explicit page ranges.
#[instrument(skip_all, fields(bytes_len = input.len(), mode = ?mode))]
pub async fn split(input: &[u8], mode: &SplitMode, progress: &mut dyn ProgressSink) -> Result<Vec<Vec<u8>>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = run(input, mode, &mut reporter).await;
    reporter.conclude(result)
}

async fn run(input: &[u8], mode: &SplitMode, reporter: &mut ProgressReporter<'_>) -> Result<Vec<Vec<u8>>> {
    // Option errors come before any parsing.
    if let SplitMode::ByPageCount(0) = mode {
        return Err(DocMorphError::validation("pages per file must be at least 1"));
    }
    if let SplitMode::ByRanges(ranges) = mode {
        if ranges.is_empty() {
            return Err(DocMorphError::validation("ranges mode needs at least one page range"));
        }
    }

    reporter.report(10, "Loading PDF...");
    yield_now().await;
    let source = DocumentContainer::from_bytes(input)?;
    let page_count = source.page_count();

    reporter.report(30, "Preparing split...");
    let chunks = plan(mode, page_count)?;
    yield_now().await;

    let total = chunks.len();
    let mut outputs = Vec::with_capacity(total);
    for (i, chunk) in chunks.into_iter().enumerate() {
        let mut part = DocumentContainer::new();
        let indices: Vec<usize> = chunk.collect();
        for handle in part.copy_pages(&source, &indices)? {
            part.add_page(handle)?;
        }
        outputs.push(part.to_bytes(&SerializeOptions::default())?);
        debug!(part = i + 1, pages = indices.len(), "part written");

        reporter.step(30, 90, i + 1, total, format!("Created file {} of {total}", i + 1));
        yield_now().await;
    }

    info!(parts = outputs.len(), page_count, "split complete");
    reporter.finish("Split complete!");
    Ok(outputs)
}

/// 0-based page-index ranges, one per output document.
fn plan(mode: &SplitMode, page_count: usize) -> Result<Vec<Range<usize>>> {
    match mode {
        SplitMode::ByPageCount(per_file) => {
            let per_file = (*per_file).max(1);
            Ok((0..page_count)
                .step_by(per_file)
                .map(|start| start..(start + per_file).min(page_count))
                .collect())
        }
        SplitMode::ByRanges(ranges) => ranges.iter().map(|range| range.resolve(page_count)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{document_with_pages, page_texts};
    use docmorph_core::{ErrorKind, PageRange, RecordingSink};

    fn part_texts(part: &[u8]) -> Vec<String> {
        let container = DocumentContainer::from_bytes(part).unwrap();
        (0..container.page_count())
            .map(|i| page_texts(&container, i).join(""))
            .collect()
    }

    /// 10 pages, 3 per file: sizes 3, 3, 3, 1 concatenating back to the input.
    #[tokio::test]
    async fn chunks_by_page_count() {
        let input = document_with_pages(10);
        let mut sink = RecordingSink::new();
        let parts = split(&input, &SplitMode::ByPageCount(3), &mut sink).await.unwrap();

        let sizes: Vec<usize> = parts.iter().map(|p| part_texts(p).len()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);

        let all: Vec<String> = parts.iter().flat_map(|p| part_texts(p)).collect();
        let expected: Vec<String> = (1..=10).map(|n| format!("Page {n}")).collect();
        assert_eq!(all, expected);

        assert_eq!(sink.percents(), vec![10, 30, 45, 60, 75, 90, 100]);
    }

    #[tokio::test]
    async fn single_page_parts() {
        let input = document_with_pages(2);
        let mut sink = RecordingSink::new();
        let parts = split(&input, &SplitMode::ByPageCount(1), &mut sink).await.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(part_texts(&parts[1]), vec!["Page 2"]);
    }

    #[tokio::test]
    async fn zero_pages_per_file_is_rejected() {
        let mut sink = RecordingSink::new();
        let err = split(b"irrelevant", &SplitMode::ByPageCount(0), &mut sink).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn explicit_ranges_may_overlap_and_reorder() {
        let input = document_with_pages(6);
        let mode = SplitMode::ByRanges(vec![
            "5-".parse::<PageRange>().unwrap(),
            "1-2".parse().unwrap(),
            "2".parse().unwrap(),
        ]);
        let mut sink = RecordingSink::new();
        let parts = split(&input, &mode, &mut sink).await.unwrap();
        assert_eq!(part_texts(&parts[0]), vec!["Page 5", "Page 6"]);
        assert_eq!(part_texts(&parts[1]), vec!["Page 1", "Page 2"]);
        assert_eq!(part_texts(&parts[2]), vec!["Page 2"]);
    }

    #[tokio::test]
    async fn empty_or_out_of_bounds_ranges_are_rejected() {
        let input = document_with_pages(3);
        let mut sink = RecordingSink::new();
        let err = split(&input, &SplitMode::ByRanges(Vec::new()), &mut sink).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mode = SplitMode::ByRanges(vec!["2-9".parse().unwrap()]);
        let err = split(&input, &mode, &mut sink).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
