// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people holding a card up to a camera.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives presentation; the status code is what a request
// handler in front of the reader should answer with.

use crate::error::AusweisError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Glitch in the recognition backend or the filesystem — trying again may help.
    Transient,
    /// User must do something (retake the photo, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying — wrong file format, broken install.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether re-running the same request could succeed.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
    /// HTTP-style status for service front ends.
    pub status: u16,
}

impl HumanError {
    /// Status code a request handler should map this error to.
    pub fn status_code(&self) -> u16 {
        self.status
    }
}

/// Convert an `AusweisError` into a `HumanError` that anyone can act on.
pub fn humanize_error(err: &AusweisError) -> HumanError {
    match err {
        // -- Input errors --
        AusweisError::InvalidImage(_) => HumanError {
            message: "That file doesn't look like a photo we can read.".into(),
            suggestion: "Upload a JPEG or PNG picture of the front of the card.".into(),
            retriable: false,
            severity: Severity::Permanent,
            status: 400,
        },

        AusweisError::ImageError(_) => HumanError {
            message: "We couldn't save the processed image.".into(),
            suggestion: "Check there is free space where the output is written, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
            status: 500,
        },

        // -- Pipeline outcomes --
        AusweisError::CardNotDetected => HumanError {
            message: "We couldn't find an ID card in the photo.".into(),
            suggestion: "Place the card on a plain, contrasting surface so all four corners are visible, and take the photo from directly above.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
            status: 404,
        },

        AusweisError::NoMrzData => HumanError {
            message: "We found the card but couldn't read the machine-readable zone.".into(),
            suggestion: "Make sure the side with the lines of <<< characters is facing the camera, in focus, and free of glare.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
            status: 422,
        },

        AusweisError::OcrError(_) => HumanError {
            message: "Text recognition didn't work on this card.".into(),
            suggestion: "Try again. If this keeps happening, check that the recognition models are installed.".into(),
            retriable: true,
            severity: Severity::Transient,
            status: 500,
        },

        // -- Configuration --
        AusweisError::Config(detail) => HumanError {
            message: "The detector settings aren't valid.".into(),
            suggestion: format!("Fix the configuration and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
            status: 500,
        },

        // -- Storage --
        AusweisError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                    status: 500,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file to a different location first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                    status: 500,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                    status: 500,
                }
            }
        }

        AusweisError::Serialization(_) => HumanError {
            message: "A settings or result file couldn't be read.".into(),
            suggestion: "Check that the configuration file is valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
            status: 500,
        },
    }
}
