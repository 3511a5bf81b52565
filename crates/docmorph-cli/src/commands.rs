// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers. Each reads its inputs from disk, runs one engine
// operation, and hands the result to the output packager.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docmorph_core::error::{DocMorphError, Result};
use docmorph_core::{EngineConfig, Operation, ProgressEvent, ProgressSink, SplitMode, WatermarkSpec};
use docmorph_document::backend::{ContentStreamExtractor, HttpFetcher};
use docmorph_document::backend::http::parse_capture_url;
use docmorph_document::pdf::DocumentMetadata;
use docmorph_document::{
    DirectorySink, DocumentContainer, OperationResult, OutputNaming, OutputPackager, ops,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::backends::{NoMarkupRenderer, SurfaceRasterizer, page_rasterizer};
use crate::cli::{Cli, Command};

/// Progress lines on stderr.
struct StderrProgress {
    quiet: bool,
}

impl ProgressSink for StderrProgress {
    fn emit(&mut self, event: ProgressEvent) {
        if self.quiet {
            return;
        }
        match &event.error {
            Some(error) => eprintln!("[{:>3}%] {} ({error})", event.percent, event.status),
            None => eprintln!("[{:>3}%] {}", event.percent, event.status),
        }
    }
}

pub async fn run(cli: &Cli, config: &EngineConfig) -> Result<()> {
    let out_dir = cli
        .out
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let mut progress = StderrProgress { quiet: cli.quiet };
    debug!(out_dir = %out_dir.display(), "running command");

    match &cli.command {
        Command::Info { input, json } => info_command(input, *json),

        Command::Merge { inputs } => {
            let files = inputs.iter().map(|path| read_input(path)).collect::<Result<Vec<_>>>()?;
            let refs: Vec<&[u8]> = files.iter().map(Vec::as_slice).collect();
            let merged = ops::merge(&refs, &mut progress).await?;
            deliver(merged.into(), Operation::Merge, None, &out_dir)
        }

        Command::Split {
            input,
            pages_per_file,
            ranges,
        } => {
            let mode = match (pages_per_file, ranges.is_empty()) {
                (Some(count), _) => SplitMode::ByPageCount(*count),
                (None, false) => SplitMode::ByRanges(ranges.clone()),
                (None, true) => SplitMode::ByPageCount(config.defaults.pages_per_file),
            };
            let parts = ops::split(&read_input(input)?, &mode, &mut progress).await?;
            deliver(parts.into(), Operation::Split, file_name(input), &out_dir)
        }

        Command::Rotate { input, degrees, pages } => {
            let targets = page_indices(pages)?;
            let rotated = ops::rotate(&read_input(input)?, *degrees, targets.as_deref(), &mut progress).await?;
            deliver(rotated.into(), Operation::Rotate, file_name(input), &out_dir)
        }

        Command::Compress { input, level } => {
            let level = level.unwrap_or(config.defaults.compression_level);
            let compressed = ops::compress(&read_input(input)?, level, &mut progress).await?;
            deliver(compressed.into(), Operation::Compress, file_name(input), &out_dir)
        }

        Command::Watermark {
            input,
            text,
            opacity,
            size,
            rotation,
            anchor,
        } => {
            let defaults = &config.defaults;
            let spec = WatermarkSpec::new(text.as_str())
                .with_opacity(opacity.unwrap_or(defaults.watermark_opacity))
                .with_font_size(size.unwrap_or(defaults.watermark_font_size))
                .with_rotation(rotation.unwrap_or(defaults.watermark_rotation))
                .with_anchor(*anchor)
                .with_color(defaults.watermark_color);
            let stamped = ops::watermark(&read_input(input)?, &spec, &mut progress).await?;
            deliver(stamped.into(), Operation::Watermark, file_name(input), &out_dir)
        }

        Command::ToImage { input, format } => {
            let bytes = read_input(input)?;
            let rasterizer = page_rasterizer(config)?;
            let images =
                ops::export_images(&bytes, *format, rasterizer.as_ref(), &config.raster, &mut progress).await?;
            deliver(images.into(), Operation::ExportImage(*format), file_name(input), &out_dir)
        }

        Command::ToOffice { input, format } => {
            let package =
                ops::export_office(&read_input(input)?, *format, &ContentStreamExtractor, &mut progress).await?;
            deliver(package.into(), Operation::ExportOffice(*format), file_name(input), &out_dir)
        }

        Command::Capture { url, file } => {
            let (captured, source) = match (url, file) {
                (Some(url), _) => {
                    let host = parse_capture_url(url)?.host_str().map(str::to_string);
                    let fetcher = HttpFetcher::new(Arc::new(NoMarkupRenderer))?;
                    let pdf = ops::capture_url(url, &fetcher, &SurfaceRasterizer, &config.capture, &mut progress)
                        .await?;
                    (pdf, host)
                }
                (None, Some(path)) => {
                    let markup = std::fs::read_to_string(path)?;
                    let pdf = ops::capture_markup(
                        &markup,
                        &NoMarkupRenderer,
                        &SurfaceRasterizer,
                        &config.capture,
                        &mut progress,
                    )
                    .await?;
                    let stem = path.file_stem().map(|stem| stem.to_string_lossy().into_owned());
                    (pdf, stem)
                }
                (None, None) => return Err(DocMorphError::validation("capture needs --url or --file")),
            };
            deliver(captured.into(), Operation::WebCapture, source.as_deref(), &out_dir)
        }
    }
}

// -- Info ---------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct InfoReport {
    page_count: usize,
    metadata: DocumentMetadata,
    pages: Vec<PageReport>,
}

#[derive(Debug, Serialize)]
struct PageReport {
    number: usize,
    width: f32,
    height: f32,
    rotation: i32,
    fingerprint: String,
}

fn info_report(bytes: &[u8]) -> Result<InfoReport> {
    let container = DocumentContainer::from_bytes(bytes)?;
    let pages = container
        .pages()?
        .into_iter()
        .map(|page| {
            Ok(PageReport {
                number: page.index + 1,
                width: page.width,
                height: page.height,
                rotation: page.rotation,
                fingerprint: container.page_fingerprint(page.index)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InfoReport {
        page_count: container.page_count(),
        metadata: container.metadata(),
        pages,
    })
}

fn info_command(input: &Path, json: bool) -> Result<()> {
    let report = info_report(&read_input(input)?)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}: {} page(s)", input.display(), report.page_count);
    let metadata = &report.metadata;
    for (label, value) in [
        ("Title", &metadata.title),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
        ("Producer", &metadata.producer),
        ("Creator", &metadata.creator),
    ] {
        if let Some(value) = value {
            println!("  {label:<9} {value}");
        }
    }
    for page in &report.pages {
        println!(
            "  page {:>4}  {:>7.1} x {:<7.1} pt  rot {:>3}  {}",
            page.number,
            page.width,
            page.height,
            page.rotation,
            &page.fingerprint[..16.min(page.fingerprint.len())]
        );
    }
    Ok(())
}

// -- Helpers ------------------------------------------------------------------

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "input read");
    Ok(bytes)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// 1-based page numbers to 0-based indices; no numbers means every page.
fn page_indices(pages: &[usize]) -> Result<Option<Vec<usize>>> {
    if pages.is_empty() {
        return Ok(None);
    }
    pages
        .iter()
        .map(|&number| {
            number
                .checked_sub(1)
                .ok_or_else(|| DocMorphError::validation("page numbers start at 1"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn deliver(result: OperationResult, operation: Operation, source: Option<&str>, out_dir: &Path) -> Result<()> {
    let naming = OutputNaming::new(operation, source);
    let mut sink = DirectorySink::new(out_dir)?;
    let name = OutputPackager::deliver(result, &naming, &mut sink)?;
    info!(name = %name, "output delivered");
    println!("{}", out_dir.join(name).display());
    Ok(())
}
