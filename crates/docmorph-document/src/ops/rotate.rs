// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::collections::BTreeSet;

use docmorph_core::error::Result;
use docmorph_core::progress::{ProgressReporter, ProgressSink};
use tokio::task::yield_now;
use tracing::{info, instrument, warn};

use crate::pdf::{DocumentContainer, SerializeOptions};

/// Add `delta_degrees` to the rotation of the targeted pages (all pages when
/// `targets` is `None`).
///
/// Any integer is accepted and the result is stored normalised into
/// `[0, 360)`; viewers only honour multiples of 90. Target indices outside
/// the document are ignored.
#[instrument(skip_all, fields(bytes_len = input.len(), delta_degrees = delta_degrees))]
pub async fn rotate(
    input: &[u8],
    delta_degrees: i32,
    targets: Option<&[usize]>,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<u8>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = run(input, delta_degrees, targets, &mut reporter).await;
    reporter.conclude(result)
}

async fn run(
    input: &[u8],
    delta_degrees: i32,
    targets: Option<&[usize]>,
    reporter: &mut ProgressReporter<'_>,
) -> Result<Vec<u8>> {
    reporter.report(10, "Loading PDF...");
    yield_now().await;
    let mut container = DocumentContainer::from_bytes(input)?;
    let page_count = container.page_count();

    reporter.report(50, "Rotating pages...");
    yield_now().await;

    // Each page turns once however often it is named.
    let indices: BTreeSet<usize> = match targets {
        None => (0..page_count).collect(),
        Some(targets) => {
            let (inside, outside): (Vec<usize>, Vec<usize>) =
                targets.iter().copied().partition(|&index| index < page_count);
            if !outside.is_empty() {
                warn!(?outside, page_count, "ignoring rotate targets beyond the document");
            }
            inside.into_iter().collect()
        }
    };

    for &index in &indices {
        let current = container.page(index)?.rotation;
        container.set_rotation(index, current + delta_degrees.rem_euclid(360))?;
    }

    reporter.report(80, "Saving PDF...");
    yield_now().await;
    let output = container.to_bytes(&SerializeOptions::default())?;

    info!(rotated = indices.len(), page_count, "rotation complete");
    reporter.finish("Rotation complete!");
    Ok(output)
}
