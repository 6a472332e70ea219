// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field extraction seam — anything that turns a rectified card into fields.
//
// The detector only hands over a well-formed crop; what reads it (OCR + MRZ
// parsing, a remote service, a test stub) sits behind these traits.

use ausweis_core::IdFields;
use ausweis_core::error::Result;
use image::DynamicImage;
use tracing::{debug, instrument};

use crate::scan::mrz;

/// Reads structured fields from a rectified card image.
///
/// `Ok(None)` means the card was readable but carried no usable data.
pub trait FieldExtractor {
    fn extract(&self, rectified: &DynamicImage) -> Result<Option<IdFields>>;
}

impl<F> FieldExtractor for F
where
    F: Fn(&DynamicImage) -> Result<Option<IdFields>>,
{
    fn extract(&self, rectified: &DynamicImage) -> Result<Option<IdFields>> {
        self(rectified)
    }
}

/// Recognises the text printed on an image, one line per text line.
pub trait TextRecognizer {
    fn recognize_text(&self, image: &DynamicImage) -> Result<String>;
}

/// Extracts fields by recognising the card's text and parsing its MRZ.
pub struct MrzExtractor<R> {
    recognizer: R,
}

impl<R: TextRecognizer> MrzExtractor<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }
}

impl<R: TextRecognizer> FieldExtractor for MrzExtractor<R> {
    #[instrument(skip_all, fields(width = rectified.width(), height = rectified.height()))]
    fn extract(&self, rectified: &DynamicImage) -> Result<Option<IdFields>> {
        let text = self.recognizer.recognize_text(rectified)?;
        let fields = mrz::parse_mrz(&text);
        debug!(found = fields.is_some(), lines = text.lines().count(), "MRZ parse finished");
        Ok(fields)
    }
}
