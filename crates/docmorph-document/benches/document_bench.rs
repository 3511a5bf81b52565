// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the page-copying operations in the
// docmorph-document crate, on in-memory fixture documents.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use docmorph_core::{NoProgress, SplitMode};
use docmorph_document::testing::document_with_pages;
use docmorph_document::{merge, split};
use tokio::runtime::Runtime;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Merge four 25-page documents into one 100-page document.
fn bench_merge(c: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime");
    let inputs: Vec<Vec<u8>> = (0..4).map(|_| document_with_pages(25)).collect();
    let refs: Vec<&[u8]> = inputs.iter().map(Vec::as_slice).collect();

    c.bench_function("merge (4 x 25 pages)", |b| {
        b.iter(|| {
            let merged = runtime.block_on(merge(black_box(&refs), &mut NoProgress));
            black_box(merged.expect("merge succeeds"));
        });
    });
}

/// Split a 100-page document into single pages.
fn bench_split(c: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime");
    let input = document_with_pages(100);
    let mode = SplitMode::ByPageCount(1);

    c.bench_function("split (100 pages, 1 per file)", |b| {
        b.iter(|| {
            let parts = runtime.block_on(split(black_box(&input), &mode, &mut NoProgress));
            black_box(parts.expect("split succeeds"));
        });
    });
}

criterion_group!(benches, bench_merge, bench_split);
criterion_main!(benches);
