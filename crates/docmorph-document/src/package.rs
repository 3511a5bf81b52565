// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output packaging: turn an operation's blobs into named deliverables:
// a single file, or a deflate ZIP when there are many.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use docmorph_core::Operation;
use docmorph_core::error::{DocMorphError, Result};
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// What an operation produced. Exactly one of the two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Single(Vec<u8>),
    Many(Vec<Vec<u8>>),
}

impl OperationResult {
    /// Number of blobs carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(blobs) => blobs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for OperationResult {
    fn from(blob: Vec<u8>) -> Self {
        Self::Single(blob)
    }
}

impl From<Vec<Vec<u8>>> for OperationResult {
    fn from(blobs: Vec<Vec<u8>>) -> Self {
        Self::Many(blobs)
    }
}

/// One file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Pack entries into a deflate ZIP. Names must be unique.
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn pack_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut seen = HashSet::new();
    for entry in entries {
        if entry.filename.is_empty() {
            return Err(DocMorphError::packaging("archive entry without a name"));
        }
        if !seen.insert(entry.filename.as_str()) {
            return Err(DocMorphError::packaging(format!(
                "duplicate archive entry '{}'",
                entry.filename
            )));
        }
    }

    let zip_err = |err: zip::result::ZipError| DocMorphError::packaging(format!("ZIP write failed: {err}"));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        writer.start_file(entry.filename.as_str(), options).map_err(zip_err)?;
        writer.write_all(&entry.data)?;
    }
    let archive = writer.finish().map_err(zip_err)?.into_inner();

    debug!(bytes = archive.len(), "archive packed");
    Ok(archive)
}

/// Naming inputs for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    pub operation: Operation,
    /// File name of the (first) input, when there is one.
    pub source_name: Option<String>,
}

impl OutputNaming {
    pub fn new(operation: Operation, source_name: Option<&str>) -> Self {
        Self {
            operation,
            source_name: source_name.map(str::to_string),
        }
    }

    /// Input name without directory or extension. A captured page's source
    /// name is its host name and is kept whole.
    fn stem(&self) -> Option<String> {
        let name = self.source_name.as_deref()?;
        let stem = match self.operation {
            Operation::WebCapture => name.trim().to_string(),
            _ => Path::new(name).file_stem()?.to_string_lossy().into_owned(),
        };
        (!stem.is_empty()).then_some(stem)
    }

    /// Name for a single-blob result.
    pub fn single_name(&self) -> String {
        let extension = self.operation.extension();
        match (self.stem(), self.operation) {
            // Merging many files has no meaningful source name.
            (_, Operation::Merge) | (None, _) => self.operation.default_filename(),
            (Some(stem), operation) => match operation.suffix() {
                Some(suffix) => format!("{stem}_{suffix}.{extension}"),
                None => format!("{stem}.{extension}"),
            },
        }
    }

    /// Name of the `number`th (1-based) entry of a multi-blob result.
    pub fn entry_name(&self, number: usize) -> String {
        let extension = self.operation.extension();
        match (self.operation, self.stem()) {
            (Operation::Split, Some(stem)) => format!("{stem}_part_{number}.{extension}"),
            (Operation::Split, None) => format!("part_{number}.{extension}"),
            _ => format!("page_{number}.{extension}"),
        }
    }

    /// Name of the archive carrying a multi-blob result.
    pub fn archive_name(&self) -> String {
        match (self.operation, self.stem()) {
            (Operation::Split, Some(stem)) => format!("{stem}_split.zip"),
            (Operation::Split, None) => "split.zip".into(),
            (operation, _) => format!("pdf_to_{}.zip", operation.extension()),
        }
    }
}

/// Final destination of delivered files.
pub trait DownloadSink {
    fn deliver(&mut self, data: &[u8], filename: &str) -> Result<()>;
}

/// Writes deliveries into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Create the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    /// Paths written so far, in delivery order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, data: &[u8], filename: &str) -> Result<()> {
        // Never let a derived name escape the output directory.
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| DocMorphError::packaging(format!("unusable output name '{filename}'")))?;
        let path = self.dir.join(name);
        std::fs::write(&path, data)?;
        info!(path = %path.display(), bytes = data.len(), "output written");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps deliveries in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, data: &[u8], filename: &str) -> Result<()> {
        self.files.push((filename.to_string(), data.to_vec()));
        Ok(())
    }
}

/// Decides between single-file and archive delivery.
pub struct OutputPackager;

impl OutputPackager {
    /// Deliver `result` and return the name it was delivered under.
    ///
    /// A one-element `Many` result is still delivered as an archive so the
    /// shape of the output follows the operation, not the input.
    #[instrument(skip_all, fields(operation = ?naming.operation, blobs = result.len()))]
    pub fn deliver(result: OperationResult, naming: &OutputNaming, sink: &mut dyn DownloadSink) -> Result<String> {
        match result {
            OperationResult::Single(blob) => {
                let name = naming.single_name();
                sink.deliver(&blob, &name)?;
                Ok(name)
            }
            OperationResult::Many(blobs) => {
                if blobs.is_empty() {
                    return Err(DocMorphError::packaging("operation produced no output"));
                }
                let entries: Vec<ArchiveEntry> = blobs
                    .into_iter()
                    .enumerate()
                    .map(|(i, data)| ArchiveEntry {
                        filename: naming.entry_name(i + 1),
                        data,
                    })
                    .collect();
                let archive = pack_archive(&entries)?;
                let name = naming.archive_name();
                sink.deliver(&archive, &name)?;
                Ok(name)
            }
        }
    }
}
