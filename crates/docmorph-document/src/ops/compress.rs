// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use docmorph_core::CompressionLevel;
use docmorph_core::error::Result;
use docmorph_core::progress::{ProgressReporter, ProgressSink};
use tokio::task::yield_now;
use tracing::{info, instrument};

use crate::pdf::{DocumentContainer, SerializeOptions};

/// Re-serialise passes for each level. Every level flate-encodes streams
/// and packs objects into object streams sized by the level's batch size.
/// Medium also drops empty streams and unreachable objects; High also
/// renumbers what is left.
pub fn serialize_options(level: CompressionLevel) -> SerializeOptions {
    let medium = matches!(level, CompressionLevel::Medium | CompressionLevel::High);
    SerializeOptions {
        compress_streams: true,
        delete_zero_length_streams: medium,
        prune_unreferenced: medium,
        renumber: level == CompressionLevel::High,
        objects_per_stream: Some(level.objects_per_batch()),
    }
}

/// Strip descriptive metadata and re-serialise at `level`. The output may
/// be no smaller than the input.
#[instrument(skip_all, fields(bytes_len = input.len(), level = ?level))]
pub async fn compress(input: &[u8], level: CompressionLevel, progress: &mut dyn ProgressSink) -> Result<Vec<u8>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = run(input, level, &mut reporter).await;
    reporter.conclude(result)
}

async fn run(input: &[u8], level: CompressionLevel, reporter: &mut ProgressReporter<'_>) -> Result<Vec<u8>> {
    reporter.report(10, "Loading PDF...");
    yield_now().await;
    let mut container = DocumentContainer::from_bytes(input)?;

    reporter.report(50, "Compressing...");
    yield_now().await;
    let stripped = container.strip_metadata();

    reporter.report(80, "Optimizing...");
    yield_now().await;
    let output = container.to_bytes(&serialize_options(level))?;

    info!(
        stripped,
        objects_per_batch = level.objects_per_batch(),
        input_bytes = input.len(),
        output_bytes = output.len(),
        "compression complete"
    );
    reporter.finish("Compression complete!");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{document_with_metadata, document_with_pages};
    use docmorph_core::RecordingSink;

    #[tokio::test]
    async fn metadata_is_stripped_at_every_level() {
        let input = document_with_metadata();
        assert_eq!(
            DocumentContainer::from_bytes(&input).unwrap().metadata().title.as_deref(),
            Some("Secret plans")
        );
        for level in [CompressionLevel::Low, CompressionLevel::Medium, CompressionLevel::High] {
            let mut sink = RecordingSink::new();
            let output = compress(&input, level, &mut sink).await.unwrap();
            let container = DocumentContainer::from_bytes(&output).unwrap();
            assert!(container.metadata().is_empty(), "{level:?}");
            assert_eq!(container.page_count(), 1);
            assert_eq!(sink.percents(), vec![10, 50, 80, 100]);
        }
    }

    /// Content survives the re-serialisation unchanged.
    #[tokio::test]
    async fn page_content_is_preserved() {
        let input = document_with_pages(4);
        let before = DocumentContainer::from_bytes(&input).unwrap();
        let output = compress(&input, CompressionLevel::High, &mut RecordingSink::new()).await.unwrap();
        let after = DocumentContainer::from_bytes(&output).unwrap();
        for index in 0..4 {
            assert_eq!(
                after.page_fingerprint(index).unwrap(),
                before.page_fingerprint(index).unwrap()
            );
        }
    }

    #[test]
    fn levels_add_passes() {
        assert!(!serialize_options(CompressionLevel::Low).prune_unreferenced);
        assert!(serialize_options(CompressionLevel::Medium).prune_unreferenced);
        assert!(!serialize_options(CompressionLevel::Medium).renumber);
        assert!(serialize_options(CompressionLevel::High).renumber);
    }

    #[test]
    fn batch_size_grows_with_level() {
        let per_stream = |level| serialize_options(level).objects_per_stream.unwrap();
        assert!(per_stream(CompressionLevel::Low) < per_stream(CompressionLevel::Medium));
        assert!(per_stream(CompressionLevel::Medium) < per_stream(CompressionLevel::High));
    }

    /// High output packs its dictionaries into object streams and still
    /// reads back page for page.
    #[tokio::test]
    async fn high_level_writes_object_streams() {
        let input = document_with_pages(3);
        let output = compress(&input, CompressionLevel::High, &mut RecordingSink::new()).await.unwrap();
        assert!(output.windows(b"/ObjStm".len()).any(|window| window == b"/ObjStm"));
        assert!(output.windows(b"/XRef".len()).any(|window| window == b"/XRef"));

        let container = DocumentContainer::from_bytes(&output).unwrap();
        assert_eq!(container.page_count(), 3);
        assert_eq!(crate::testing::page_texts(&container, 2), vec!["Page 3"]);
    }
}
