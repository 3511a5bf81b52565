// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for front ends.
//
// Every engine error is mapped to plain English with a clear suggestion.
// Severity drives presentation; nothing here is retried automatically.

use crate::error::DocMorphError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user picked an option that cannot work; fix it and run again.
    ActionRequired,
    /// The file itself is the problem.
    BadInput,
    /// Something outside the engine failed (renderer, network, disk).
    Environment,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `DocMorphError` into a `HumanError`.
pub fn humanize_error(err: &DocMorphError) -> HumanError {
    match err {
        DocMorphError::Validation(detail) => HumanError {
            message: "One of the options can't be used.".into(),
            suggestion: format!("Check the settings and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        DocMorphError::Parse(detail) => {
            if let Some(position) = input_position(detail) {
                HumanError {
                    message: format!("File number {position} isn't a readable PDF."),
                    suggestion: "Remove that file or replace it with a working copy, then try again."
                        .into(),
                    severity: Severity::BadInput,
                }
            } else {
                HumanError {
                    message: "There's a problem with this PDF file.".into(),
                    suggestion: "The file may be damaged or password protected. Try opening it in a PDF viewer first, or try a different file.".into(),
                    severity: Severity::BadInput,
                }
            }
        }

        DocMorphError::Render(detail) => HumanError {
            message: "A page couldn't be drawn.".into(),
            suggestion: format!(
                "The rendering component may be missing or the page may use features it can't handle. ({detail})"
            ),
            severity: Severity::Environment,
        },

        DocMorphError::Timeout(_) => HumanError {
            message: "The page took too long to load.".into(),
            suggestion: "Check the address and your connection, or save the page as HTML and convert the file instead.".into(),
            severity: Severity::Environment,
        },

        DocMorphError::Packaging(detail) => HumanError {
            message: "The result couldn't be saved.".into(),
            suggestion: format!("Make sure there is free disk space and try again. ({detail})"),
            severity: Severity::Environment,
        },

        DocMorphError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "That file couldn't be found.".into(),
                suggestion: "Check the file name and folder, then try again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "DocMorph isn't allowed to use that file or folder.".into(),
                suggestion: "Choose a different location or change the file permissions.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "A file couldn't be read or written.".into(),
                suggestion: format!("Try again. ({io_err})"),
                severity: Severity::Environment,
            },
        },

        DocMorphError::Serialization(_) => HumanError {
            message: "The settings file is damaged.".into(),
            suggestion: "Fix or delete the config file to go back to the default settings.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

/// Extract `N` from a detail string of the form `input #N: ...`.
fn input_position(detail: &str) -> Option<usize> {
    let rest = detail.split_once("input #")?.1;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
