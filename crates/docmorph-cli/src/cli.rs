// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docmorph_core::{Anchor, CompressionLevel, ImageFormat, OfficeFormat, PageRange};

#[derive(Parser, Debug)]
#[command(name = "docmorph", version, about = "Transform PDF files locally")]
pub struct Cli {
    /// Engine config file (JSON). Defaults to the per-user config if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory outputs are written into.
    #[arg(long, short, global = true)]
    pub out: Option<PathBuf>,

    /// Do not print progress lines.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show page geometry, metadata and page fingerprints.
    Info {
        input: PathBuf,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Concatenate documents in the order given.
    Merge {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },

    /// Split a document into fixed-size chunks or explicit ranges.
    Split {
        input: PathBuf,
        /// Pages per output file.
        #[arg(long, conflicts_with = "ranges")]
        pages_per_file: Option<usize>,
        /// Comma-separated 1-based ranges, e.g. `1-3,5,8-`.
        #[arg(long, value_delimiter = ',')]
        ranges: Vec<PageRange>,
    },

    /// Rotate pages clockwise.
    Rotate {
        input: PathBuf,
        /// Degrees to add to each page's rotation.
        #[arg(long, default_value_t = 90, allow_hyphen_values = true)]
        degrees: i32,
        /// Comma-separated 1-based page numbers; all pages when omitted.
        #[arg(long, value_delimiter = ',')]
        pages: Vec<usize>,
    },

    /// Strip metadata and re-serialise more compactly.
    Compress {
        input: PathBuf,
        /// low, medium or high.
        #[arg(long)]
        level: Option<CompressionLevel>,
    },

    /// Stamp text on every page.
    Watermark {
        input: PathBuf,
        #[arg(long)]
        text: String,
        #[arg(long)]
        opacity: Option<f32>,
        /// Font size in points.
        #[arg(long)]
        size: Option<f32>,
        /// Counter-clockwise rotation in degrees.
        #[arg(long, allow_hyphen_values = true)]
        rotation: Option<f32>,
        /// center, top-left, top-right, bottom-left or bottom-right.
        #[arg(long, default_value = "center")]
        anchor: Anchor,
    },

    /// Render every page to an image.
    ToImage {
        input: PathBuf,
        /// png or jpeg.
        #[arg(long, default_value = "png")]
        format: ImageFormat,
    },

    /// Export the text of every page to a Word or Excel file.
    ToOffice {
        input: PathBuf,
        /// docx or xlsx.
        #[arg(long, default_value = "docx")]
        format: OfficeFormat,
    },

    /// Capture a web page or local markup file as a paginated PDF.
    Capture {
        /// http(s) URL to load.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        url: Option<String>,
        /// Local markup file to render.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}
