// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for DocMorph.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all DocMorph operations.
///
/// Backend failures are wrapped into one of these variants with the
/// originating message kept as the payload. Nothing in the engine retries.
#[derive(Debug, Error)]
pub enum DocMorphError {
    /// Bad option values (empty watermark text, zero pages per file, ...).
    #[error("invalid option: {0}")]
    Validation(String),

    /// Input bytes are not a well-formed document, or a page is structurally
    /// invalid at the container level.
    #[error("document could not be parsed: {0}")]
    Parse(String),

    /// Rasterization, text extraction, or capture backend failure.
    #[error("rendering failed: {0}")]
    Render(String),

    /// A bounded external wait was exceeded.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Archive or serialization failure while assembling output.
    #[error("output packaging failed: {0}")]
    Packaging(String),

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The five failure kinds callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Parse,
    Render,
    Timeout,
    Packaging,
}

impl DocMorphError {
    /// Classify this error into one of the five engine kinds.
    ///
    /// I/O and serialization failures only occur while reading config or
    /// writing output, so they count as packaging failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Render(_) => ErrorKind::Render,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Packaging(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::Packaging,
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::Parse(detail.into())
    }

    pub fn render(detail: impl Into<String>) -> Self {
        Self::Render(detail.into())
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::Timeout(detail.into())
    }

    pub fn packaging(detail: impl Into<String>) -> Self {
        Self::Packaging(detail.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocMorphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_classify_as_packaging() {
        let err: DocMorphError = std::io::Error::other("disk full").into();
        assert_eq!(err.kind(), ErrorKind::Packaging);
    }

    #[test]
    fn display_keeps_backend_message() {
        let err = DocMorphError::parse("input #2: invalid xref");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("input #2: invalid xref"));
    }
}
