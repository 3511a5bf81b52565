// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal OOXML writers. Each page of extracted text becomes one DOCX
// paragraph or one XLSX row; nothing else (styles, fonts, layout) is carried
// over.

use docmorph_core::OfficeFormat;
use docmorph_core::error::Result;

use crate::package::{ArchiveEntry, pack_archive};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Text of one page, already grouped into lines.
pub type PageLines = Vec<String>;

/// Build an office package of `format` from per-page lines.
pub fn build_office(format: OfficeFormat, pages: &[PageLines]) -> Result<Vec<u8>> {
    match format {
        OfficeFormat::Docx => build_docx(pages),
        OfficeFormat::Xlsx => build_xlsx(pages),
    }
}

// -- DOCX ---------------------------------------------------------------------

pub fn build_docx(pages: &[PageLines]) -> Result<Vec<u8>> {
    let content_types = format!(
        "{XML_HEADER}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/word/document.xml\" \
         ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
         </Types>"
    );
    let rels = format!(
        "{XML_HEADER}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" \
         Target=\"word/document.xml\"/>\
         </Relationships>"
    );

    let mut body = String::new();
    for (i, lines) in pages.iter().enumerate() {
        if i > 0 {
            body.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
        }
        body.push_str(&docx_paragraph(lines));
    }
    let document = format!(
        "{XML_HEADER}<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/></w:sectPr></w:body></w:document>"
    );

    pack_archive(&[
        entry("[Content_Types].xml", content_types),
        entry("_rels/.rels", rels),
        entry("word/document.xml", document),
    ])
}

/// One paragraph; lines are separated by soft line breaks.
fn docx_paragraph(lines: &[String]) -> String {
    let lines: Vec<&String> = lines.iter().filter(|line| !line.is_empty()).collect();
    if lines.is_empty() {
        return "<w:p/>".into();
    }
    let mut run = String::from("<w:p><w:r>");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            run.push_str("<w:br/>");
        }
        run.push_str("<w:t xml:space=\"preserve\">");
        run.push_str(&escape_xml(line));
        run.push_str("</w:t>");
    }
    run.push_str("</w:r></w:p>");
    run
}

// -- XLSX ---------------------------------------------------------------------

pub fn build_xlsx(pages: &[PageLines]) -> Result<Vec<u8>> {
    let content_types = format!(
        "{XML_HEADER}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" \
         ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
         <Override PartName=\"/xl/worksheets/sheet1.xml\" \
         ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\
         </Types>"
    );
    let rels = format!(
        "{XML_HEADER}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" \
         Target=\"xl/workbook.xml\"/>\
         </Relationships>"
    );
    let workbook = format!(
        "{XML_HEADER}<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <sheets><sheet name=\"Pages\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>"
    );
    let workbook_rels = format!(
        "{XML_HEADER}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rId1\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" \
         Target=\"worksheets/sheet1.xml\"/>\
         </Relationships>"
    );

    let mut rows = String::new();
    for (i, lines) in pages.iter().enumerate() {
        let row = i + 1;
        let text = lines.join("\n");
        rows.push_str(&format!(
            "<row r=\"{row}\"><c r=\"A{row}\"><v>{row}</v></c>\
             <c r=\"B{row}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c></row>",
            escape_xml(&text)
        ));
    }
    let sheet = format!(
        "{XML_HEADER}<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{rows}</sheetData></worksheet>"
    );

    pack_archive(&[
        entry("[Content_Types].xml", content_types),
        entry("_rels/.rels", rels),
        entry("xl/workbook.xml", workbook),
        entry("xl/_rels/workbook.xml.rels", workbook_rels),
        entry("xl/worksheets/sheet1.xml", sheet),
    ])
}

// -- Helpers ------------------------------------------------------------------

fn entry(filename: &str, xml: String) -> ArchiveEntry {
    ArchiveEntry {
        filename: filename.into(),
        data: xml.into_bytes(),
    }
}

/// Escape markup characters and drop code points XML 1.0 cannot carry.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => escaped.push(c),
        }
    }
    escaped
}
