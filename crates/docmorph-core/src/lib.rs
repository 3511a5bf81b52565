// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocMorph — Core types, error taxonomy and progress reporting shared by the
// document engine and its front ends.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod progress;
pub mod types;

pub use config::EngineConfig;
pub use error::{DocMorphError, ErrorKind};
pub use progress::{NoProgress, ProgressEvent, ProgressReporter, ProgressSink, RecordingSink};
pub use types::*;
