// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card scanning — edge extraction, boundary search, perspective rectification,
// MRZ parsing, and optical character recognition (OCR).

pub mod contours;
pub mod detect;
pub mod edges;
pub mod mrz;
pub mod overlay;
pub mod rectify;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use detect::{CandidatePath, CardDetector, Detection};

#[cfg(feature = "ocr")]
pub use ocr::{MrzOcrExtractor, OcrEngine};
