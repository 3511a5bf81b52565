// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the DocMorph engine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DocMorphError, Result};

/// Fixed distance between a corner anchor and the page edge, in PDF units.
pub const ANCHOR_MARGIN: f32 = 50.0;

/// Named reference position on a page used to place watermark text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    /// Anchor point for a page of `width` x `height`, relative to the page
    /// origin.
    pub fn point(&self, width: f32, height: f32) -> (f32, f32) {
        match self {
            Self::Center => (width / 2.0, height / 2.0),
            Self::TopLeft => (ANCHOR_MARGIN, height - ANCHOR_MARGIN),
            Self::TopRight => (width - ANCHOR_MARGIN, height - ANCHOR_MARGIN),
            Self::BottomLeft => (ANCHOR_MARGIN, ANCHOR_MARGIN),
            Self::BottomRight => (width - ANCHOR_MARGIN, ANCHOR_MARGIN),
        }
    }
}

impl FromStr for Anchor {
    type Err = DocMorphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "center" | "centre" => Ok(Self::Center),
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            other => Err(DocMorphError::validation(format!("unknown anchor '{other}'"))),
        }
    }
}

/// RGB colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// The light grey used for watermarks unless configured otherwise.
    pub const fn watermark_grey() -> Self {
        Self::new(0.7, 0.7, 0.7)
    }
}

/// Watermark options for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSpec {
    pub text: String,
    /// Alpha in `[0.1, 1.0]`.
    pub opacity: f32,
    /// Font size in points, strictly positive.
    pub font_size: f32,
    /// Counter-clockwise rotation in degrees; any value, normalised mod 360.
    pub rotation: f32,
    pub anchor: Anchor,
    pub color: RgbColor,
}

impl WatermarkSpec {
    pub const MIN_OPACITY: f32 = 0.1;
    pub const MAX_OPACITY: f32 = 1.0;

    /// Watermark with the default settings: 50pt, 50% opacity, 45 degrees,
    /// centred, light grey.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            opacity: 0.5,
            font_size: 50.0,
            rotation: 45.0,
            anchor: Anchor::Center,
            color: RgbColor::watermark_grey(),
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_color(mut self, color: RgbColor) -> Self {
        self.color = color;
        self
    }

    /// Rotation folded into `[0, 360)`.
    pub fn normalized_rotation(&self) -> f32 {
        self.rotation.rem_euclid(360.0)
    }

    /// Reject empty text, out-of-range opacity, and non-positive sizes.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(DocMorphError::validation("watermark text must not be empty"));
        }
        if !(Self::MIN_OPACITY..=Self::MAX_OPACITY).contains(&self.opacity) {
            return Err(DocMorphError::validation(format!(
                "watermark opacity {} outside [{}, {}]",
                self.opacity,
                Self::MIN_OPACITY,
                Self::MAX_OPACITY
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(DocMorphError::validation(format!(
                "watermark font size must be positive, got {}",
                self.font_size
            )));
        }
        if !self.rotation.is_finite() {
            return Err(DocMorphError::validation("watermark rotation must be finite"));
        }
        let components = [self.color.r, self.color.g, self.color.b];
        if components.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(DocMorphError::validation("watermark colour components must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Re-serialization aggressiveness for the compress operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressionLevel {
    /// Object packing granularity: how many objects are batched per
    /// serialization step.
    pub fn objects_per_batch(&self) -> usize {
        match self {
            Self::Low => 10,
            Self::Medium => 25,
            Self::High => 50,
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = DocMorphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(DocMorphError::validation(format!(
                "unknown compression level '{other}'"
            ))),
        }
    }
}

/// Inclusive, 1-based page range as typed by a user: `3`, `2-5`, or `7-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    /// `None` means "to the last page".
    pub end: Option<u32>,
}

impl PageRange {
    /// Resolve to 0-based page indices for a document of `page_count` pages.
    pub fn resolve(&self, page_count: usize) -> Result<std::ops::Range<usize>> {
        let start = self.start as usize;
        let end = self.end.map_or(page_count, |e| e as usize);
        if start == 0 || start > end {
            return Err(DocMorphError::validation(format!("invalid page range {self}")));
        }
        if end > page_count {
            return Err(DocMorphError::validation(format!(
                "page range {self} exceeds document length {page_count}"
            )));
        }
        Ok(start - 1..end)
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "{}", self.start),
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

impl FromStr for PageRange {
    type Err = DocMorphError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DocMorphError::validation(format!("malformed page range '{s}'"));
        let parse = |part: &str| part.trim().parse::<u32>().map_err(|_| invalid());

        let trimmed = s.trim();
        match trimmed.split_once('-') {
            None => {
                let page = parse(trimmed)?;
                Ok(Self { start: page, end: Some(page) })
            }
            Some((start, end)) if end.trim().is_empty() => Ok(Self {
                start: parse(start)?,
                end: None,
            }),
            Some((start, end)) => Ok(Self {
                start: parse(start)?,
                end: Some(parse(end)?),
            }),
        }
    }
}

/// How the split operation partitions a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMode {
    /// Consecutive chunks of this many pages; the last may be shorter.
    ByPageCount(usize),
    /// One output per explicit range, in the order given.
    ByRanges(Vec<PageRange>),
}

/// Raster target for image export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = DocMorphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(DocMorphError::validation(format!("unknown image format '{other}'"))),
        }
    }
}

/// Office container targets for text export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfficeFormat {
    /// Word-processing document; one paragraph per page with page breaks.
    Docx,
    /// Spreadsheet; one row per page.
    Xlsx,
}

impl OfficeFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
        }
    }
}

impl FromStr for OfficeFormat {
    type Err = DocMorphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "docx" | "word" => Ok(Self::Docx),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(DocMorphError::validation(format!("unknown office format '{other}'"))),
        }
    }
}

/// The user-facing tools. Drives output naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Merge,
    Split,
    Compress,
    Rotate,
    Watermark,
    ExportImage(ImageFormat),
    ExportOffice(OfficeFormat),
    WebCapture,
}

impl Operation {
    /// Suffix appended to the source stem for single outputs, if any.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Compress => Some("compressed"),
            Self::Rotate => Some("rotated"),
            Self::Watermark => Some("watermarked"),
            Self::Split => Some("split"),
            Self::Merge | Self::ExportImage(_) | Self::ExportOffice(_) | Self::WebCapture => None,
        }
    }

    /// File extension of each produced blob.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::ExportImage(format) => format.extension(),
            Self::ExportOffice(format) => format.extension(),
            _ => "pdf",
        }
    }

    /// Filename used when there is no source name to derive from.
    pub fn default_filename(&self) -> String {
        match self {
            Self::Merge => "merged.pdf".into(),
            Self::Split => "split.pdf".into(),
            Self::Compress => "compressed.pdf".into(),
            Self::Rotate => "rotated.pdf".into(),
            Self::Watermark => "watermarked.pdf".into(),
            Self::ExportImage(format) => format!("converted.{}", format.extension()),
            Self::ExportOffice(format) => format!("converted.{}", format.extension()),
            Self::WebCapture => "webpage.pdf".into(),
        }
    }
}
