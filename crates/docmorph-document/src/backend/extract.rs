// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in text extractor. Walks a page's content stream and reports every
// text-showing operator at its text-matrix position.
//
// Strings are decoded through the encoding (or ToUnicode map) of the font
// selected by `Tf`. No glyph metrics are consulted: the run position is
// where the string starts.

use std::collections::BTreeMap;

use docmorph_core::error::{DocMorphError, Result};
use lopdf::content::Content;
use lopdf::{Document, Encoding, Object};
use tracing::{debug, trace};

use super::traits::{PageView, TextExtractor, TextRun};
use crate::pdf::DocumentContainer;
use crate::pdf::container::number;

/// Page font resource names mapped to their decoders.
type FontEncodings<'a> = BTreeMap<Vec<u8>, Encoding<'a>>;

/// TJ adjustments more negative than this (thousandths of an em) read as a
/// word gap.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Product `a × b`, row-vector convention as used by PDF.
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Text state carried across operators.
struct TextState {
    matrix: Matrix,
    line_matrix: Matrix,
    font_size: f32,
    leading: f32,
}

impl TextState {
    fn new() -> Self {
        Self {
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 12.0,
            leading: 0.0,
        }
    }

    fn begin(&mut self) {
        self.matrix = IDENTITY;
        self.line_matrix = IDENTITY;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn run(&self, text: String) -> TextRun {
        let [a, b, ..] = self.matrix;
        let scale = (a * a + b * b).sqrt();
        TextRun {
            text,
            x: self.matrix[4],
            y: self.matrix[5],
            font_size: self.font_size * if scale > 0.0 { scale } else { 1.0 },
        }
    }
}

/// Extracts text runs straight from the content stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentStreamExtractor;

impl TextExtractor for ContentStreamExtractor {
    fn extract_text_runs(&self, view: &PageView<'_>) -> Result<Vec<TextRun>> {
        let runs = page_runs(view.container, view.page.index)?;
        debug!(page = view.page.index, runs = runs.len(), "text runs extracted");
        Ok(runs)
    }
}

/// Text runs of page `index`, decoded with that page's fonts.
pub fn page_runs(container: &DocumentContainer, index: usize) -> Result<Vec<TextRun>> {
    let document = container.document();
    let page_id = container.page_id(index)?;
    let fonts = document
        .get_page_fonts(page_id)
        .map_err(|err| DocMorphError::render(format!("cannot read fonts of page {}: {err}", index + 1)))?;

    let encodings: FontEncodings<'_> = fonts
        .into_iter()
        .filter_map(|(name, font)| match font.get_font_encoding(document) {
            Ok(encoding) => Some((name, encoding)),
            Err(err) => {
                debug!(font = %String::from_utf8_lossy(&name), %err, "font encoding unusable");
                None
            }
        })
        .collect();

    let content = container.page_content(index)?;
    decode_runs(&content, &encodings)
}

/// Decode a raw content stream into text runs, in stream order, without
/// font information: strings are read as PDF text strings.
pub fn runs_from_content(content: &[u8]) -> Result<Vec<TextRun>> {
    decode_runs(content, &FontEncodings::new())
}

fn decode_runs(content: &[u8], encodings: &FontEncodings<'_>) -> Result<Vec<TextRun>> {
    let content = Content::decode(content)
        .map_err(|err| DocMorphError::render(format!("cannot decode content stream: {err}")))?;

    let mut state = TextState::new();
    let mut encoding: Option<&Encoding<'_>> = None;
    let mut runs = Vec::new();

    for operation in &content.operations {
        let operands = &operation.operands;
        let num = |i: usize| operands.get(i).and_then(number);

        match operation.operator.as_str() {
            "BT" => state.begin(),
            "Tf" => {
                encoding = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| encodings.get(name));
                if let Some(size) = num(1) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = num(0) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    state.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    state.leading = -ty;
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                let values: Option<Vec<f32>> = (0..6).map(num).collect();
                if let Some(values) = values {
                    let mut matrix = IDENTITY;
                    matrix.copy_from_slice(&values);
                    state.matrix = matrix;
                    state.line_matrix = matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(|text| decode_string(text, encoding)) {
                    runs.push(state.run(text));
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(|text| decode_string(text, encoding)) {
                    runs.push(state.run(text));
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(|text| decode_string(text, encoding)) {
                    runs.push(state.run(text));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text = join_tj_items(items, encoding);
                    if !text.is_empty() {
                        runs.push(state.run(text));
                    }
                }
            }
            other => trace!(operator = other, "operator ignored"),
        }
    }

    Ok(runs)
}

/// Decode a string operand with the current font's encoding, falling back
/// to text-string rules when there is none or it cannot decode.
fn decode_string(object: &Object, encoding: Option<&Encoding<'_>>) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };
    encoding
        .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
        .or_else(|| lopdf::decode_text_string(object).ok())
}

fn join_tj_items(items: &[Object], encoding: Option<&Encoding<'_>>) -> String {
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(..) => {
                if let Some(decoded) = decode_string(item, encoding) {
                    text.push_str(&decoded);
                }
            }
            other => {
                if number(other).is_some_and(|adjust| adjust < TJ_SPACE_THRESHOLD) && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
        }
    }
    text
}

/// Group runs into lines: a run whose baseline is within half a font size of
/// the current line joins it, otherwise it starts a new one. Runs keep their
/// stream order within a line.
pub fn group_lines(runs: &[TextRun]) -> Vec<String> {
    let mut lines: Vec<(f32, String)> = Vec::new();

    for run in runs {
        let text = run.text.trim_end_matches(['\r', '\n']);
        if text.trim().is_empty() {
            continue;
        }
        let tolerance = (run.font_size / 2.0).max(1.0);
        match lines.last_mut() {
            Some((baseline, line)) if (*baseline - run.y).abs() <= tolerance => {
                if !line.ends_with(' ') && !text.starts_with(' ') {
                    line.push(' ');
                }
                line.push_str(text);
            }
            _ => lines.push((run.y, text.to_string())),
        }
    }

    lines.into_iter().map(|(_, line)| line.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{document_with_texts, type0_document};
    use lopdf::content::Operation;

    fn texts(runs: &[TextRun]) -> Vec<&str> {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn td_positions_accumulate() {
        let runs = runs_from_content(b"BT /F1 12 Tf 72 700 Td (Hello) Tj 0 -14 Td (World) Tj ET").unwrap();
        assert_eq!(texts(&runs), vec!["Hello", "World"]);
        assert_eq!((runs[0].x, runs[0].y), (72.0, 700.0));
        assert_eq!((runs[1].x, runs[1].y), (72.0, 686.0));
        assert_eq!(runs[1].font_size, 12.0);
    }

    #[test]
    fn tj_kerning_inserts_word_gaps() {
        let runs = runs_from_content(b"BT /F1 10 Tf [(Hel) -20 (lo) -450 (there)] TJ ET").unwrap();
        assert_eq!(texts(&runs), vec!["Hello there"]);
    }

    /// T* and the quote operators move down by the leading.
    #[test]
    fn leading_drives_next_line() {
        let runs = runs_from_content(b"BT /F1 10 Tf 14 TL 50 500 Td (a) Tj T* (b) Tj (c) ' ET").unwrap();
        let ys: Vec<f32> = runs.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![500.0, 486.0, 472.0]);
    }

    #[test]
    fn tm_scale_is_applied_to_font_size() {
        let runs = runs_from_content(b"BT /F1 1 Tf 24 0 0 24 10 20 Tm (Big) Tj ET").unwrap();
        assert_eq!(runs[0].font_size, 24.0);
        assert_eq!((runs[0].x, runs[0].y), (10.0, 20.0));
    }

    #[test]
    fn hex_utf16_strings_decode() {
        let runs = runs_from_content(b"BT /F1 12 Tf <FEFF00480069> Tj ET").unwrap();
        assert_eq!(texts(&runs), vec!["Hi"]);
    }

    /// Identity-H strings are read through the font's ToUnicode map.
    #[test]
    fn type0_font_decodes_through_to_unicode() {
        let container = DocumentContainer::from_bytes(&type0_document()).unwrap();
        let runs = page_runs(&container, 0).unwrap();
        assert_eq!(texts(&runs), vec!["Hi"]);
        assert_eq!((runs[0].x, runs[0].y), (72.0, 720.0));
    }

    /// A UTF-16BE text string shown without a known font keeps its accents.
    #[test]
    fn utf16_text_string_decodes() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tj", vec![lopdf::text_string("Café Straße")]),
                Operation::new("ET", vec![]),
            ],
        };
        let runs = runs_from_content(&content.encode().unwrap()).unwrap();
        assert_eq!(texts(&runs), vec!["Café Straße"]);
    }

    #[test]
    fn simple_font_runs_decode_per_page() {
        let container = DocumentContainer::from_bytes(&document_with_texts(&["first", "second"])).unwrap();
        assert_eq!(texts(&page_runs(&container, 1).unwrap()), vec!["second"]);
    }

    #[test]
    fn runs_on_one_baseline_form_one_line() {
        let run = |text: &str, y: f32| TextRun { text: text.into(), x: 0.0, y, font_size: 12.0 };
        let runs = vec![run("Total:", 700.0), run("42", 701.0), run("Next line", 680.0), run("  ", 660.0)];
        assert_eq!(group_lines(&runs), vec!["Total: 42", "Next line"]);
    }
}
