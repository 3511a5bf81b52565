// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use docmorph_core::error::{DocMorphError, Result};
use docmorph_core::progress::{ProgressReporter, ProgressSink};
use tokio::task::yield_now;
use tracing::{debug, info, instrument};

use super::{open_input, tag_input};
use crate::pdf::{DocumentContainer, SerializeOptions};

/// Concatenate the pages of every input, in input order, into one document.
///
/// Any failure aborts the whole merge; the error names the 1-based
/// position of the offending input.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub async fn merge(inputs: &[&[u8]], progress: &mut dyn ProgressSink) -> Result<Vec<u8>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = run(inputs, &mut reporter).await;
    reporter.conclude(result)
}

async fn run(inputs: &[&[u8]], reporter: &mut ProgressReporter<'_>) -> Result<Vec<u8>> {
    if inputs.is_empty() {
        return Err(DocMorphError::validation("merge needs at least one input document"));
    }

    reporter.report(10, "Initializing merger...");
    yield_now().await;

    let mut merged = DocumentContainer::new();
    let total = inputs.len();

    for (i, input) in inputs.iter().enumerate() {
        reporter.step(10, 80, i, total, format!("Processing file {} of {total}...", i + 1));

        let position = i + 1;
        let source = open_input(input, position)?;
        let indices: Vec<usize> = (0..source.page_count()).collect();
        let handles = merged
            .copy_pages(&source, &indices)
            .map_err(|err| tag_input(err, position))?;
        for handle in handles {
            merged.add_page(handle).map_err(|err| tag_input(err, position))?;
        }
        debug!(input = position, pages = indices.len(), "input merged");
        yield_now().await;
    }

    reporter.report(90, "Finalizing merge...");
    yield_now().await;
    let output = merged.to_bytes(&SerializeOptions::default())?;

    info!(pages = merged.page_count(), output_bytes = output.len(), "merge complete");
    reporter.finish("Merge complete!");
    Ok(output)
}
