// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ausweis-document — ID card localisation and reading.
//
// Provides image decoding, the card detector (edge extraction, boundary search,
// corner ordering, perspective rectification), MRZ parsing, and the reader
// pipeline that ties detection to a pluggable field extractor.

pub mod extract;
pub mod image;
pub mod reader;
pub mod scan;

// Re-export the primary types so callers can use `ausweis_document::CardDetector` etc.
pub use extract::{FieldExtractor, MrzExtractor, TextRecognizer};
pub use crate::image::processor::ImageProcessor;
pub use reader::{IdReader, ReadOutcome};
pub use scan::detect::{CandidatePath, CardDetector, Detection};

#[cfg(feature = "ocr")]
pub use scan::ocr::{MrzOcrExtractor, OcrEngine};
