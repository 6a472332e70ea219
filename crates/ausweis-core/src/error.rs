// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Ausweis.

use thiserror::Error;

/// Top-level error type for all Ausweis operations.
///
/// A card that simply isn't in the picture is *not* an error at the
/// detection layer (the detector returns `Ok(None)`); `CardNotDetected` only
/// appears once the reader pipeline has to turn that into an outcome.
#[derive(Debug, Error)]
pub enum AusweisError {
    // -- Input errors --
    #[error("invalid input image: {0}")]
    InvalidImage(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Pipeline outcomes --
    #[error("ID card not detected")]
    CardNotDetected,

    #[error("unable to extract MRZ data")]
    NoMrzData,

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AusweisError>;
