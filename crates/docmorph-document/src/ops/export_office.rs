// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use docmorph_core::OfficeFormat;
use docmorph_core::error::{DocMorphError, Result};
use docmorph_core::progress::{ProgressReporter, ProgressSink};
use tokio::task::yield_now;
use tracing::{debug, info, instrument};

use crate::backend::extract::group_lines;
use crate::backend::{PageView, TextExtractor};
use crate::office::build_office;
use crate::pdf::DocumentContainer;

/// Extract each page's text and write it into an office package, one
/// paragraph (DOCX) or row (XLSX) per page.
#[instrument(skip_all, fields(bytes_len = input.len(), format = ?format))]
pub async fn export_office(
    input: &[u8],
    format: OfficeFormat,
    extractor: &dyn TextExtractor,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<u8>> {
    let mut reporter = ProgressReporter::new(progress);
    let result = run(input, format, extractor, &mut reporter).await;
    reporter.conclude(result)
}

async fn run(
    input: &[u8],
    format: OfficeFormat,
    extractor: &dyn TextExtractor,
    reporter: &mut ProgressReporter<'_>,
) -> Result<Vec<u8>> {
    reporter.report(10, "Loading PDF...");
    yield_now().await;
    let container = DocumentContainer::from_bytes(input)?;
    let pages = container.pages()?;
    let total = pages.len();

    reporter.report(30, "Extracting text...");
    let mut page_lines = Vec::with_capacity(total);
    for page in &pages {
        reporter.step(30, 80, page.index, total, format!("Reading page {} of {total}...", page.index + 1));

        let view = PageView {
            source: input,
            container: &container,
            page,
        };
        let runs = extractor.extract_text_runs(&view).map_err(|err| match err {
            DocMorphError::Render(_) => err,
            other => DocMorphError::render(format!("text extraction failed on page {}: {other}", page.index + 1)),
        })?;
        let lines = group_lines(&runs);
        debug!(page = page.index + 1, runs = runs.len(), lines = lines.len(), "page text grouped");
        page_lines.push(lines);
        yield_now().await;
    }

    reporter.report(90, "Building document...");
    yield_now().await;
    let package = build_office(format, &page_lines)?;

    info!(pages = total, bytes = package.len(), "office export complete");
    reporter.finish("Conversion complete!");
    Ok(package)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::backend::ContentStreamExtractor;
    use crate::backend::stub::FailingExtractor;
    use crate::testing::{document_with_texts, type0_document};
    use docmorph_core::{ErrorKind, RecordingSink};

    fn part(package: &[u8], name: &str) -> String {
        let mut zip = zip::ZipArchive::new(Cursor::new(package.to_vec())).unwrap();
        let mut body = String::new();
        zip.by_name(name).unwrap().read_to_string(&mut body).unwrap();
        body
    }

    /// Two pages "Hello" and "World": two paragraphs in order, one break.
    #[tokio::test]
    async fn docx_paragraphs_follow_pages() {
        let input = document_with_texts(&["Hello", "World"]);
        let mut sink = RecordingSink::new();
        let package = export_office(&input, OfficeFormat::Docx, &ContentStreamExtractor, &mut sink)
            .await
            .unwrap();

        let document = part(&package, "word/document.xml");
        let hello = document.find(">Hello<").unwrap();
        let world = document.find(">World<").unwrap();
        assert!(hello < world);
        assert_eq!(document.matches(r#"w:type="page""#).count(), 1);
        assert_eq!(sink.percents(), vec![10, 30, 30, 55, 90, 100]);
    }

    /// Text shown through a Type0 font lands in the package as Unicode.
    #[tokio::test]
    async fn docx_text_is_decoded_through_font_cmap() {
        let package = export_office(
            &type0_document(),
            OfficeFormat::Docx,
            &ContentStreamExtractor,
            &mut RecordingSink::new(),
        )
        .await
        .unwrap();
        assert!(part(&package, "word/document.xml").contains(">Hi<"));
    }

    #[tokio::test]
    async fn xlsx_rows_carry_page_numbers() {
        let input = document_with_texts(&["Alpha", "", "Gamma"]);
        let package = export_office(&input, OfficeFormat::Xlsx, &ContentStreamExtractor, &mut RecordingSink::new())
            .await
            .unwrap();
        let sheet = part(&package, "xl/worksheets/sheet1.xml");
        assert_eq!(sheet.matches("<row ").count(), 3);
        assert!(sheet.contains(r#"<c r="A3"><v>3</v></c>"#));
        assert!(sheet.contains(">Gamma<"));
    }

    #[tokio::test]
    async fn extractor_failure_is_render_error() {
        let input = document_with_texts(&["x"]);
        let err = export_office(&input, OfficeFormat::Docx, &FailingExtractor, &mut RecordingSink::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
    }
}
