// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end reader — decode, locate, rectify, extract.

use ausweis_core::IdFields;
use ausweis_core::error::{AusweisError, Result};
use image::DynamicImage;
use tracing::{info, instrument, warn};

use crate::extract::FieldExtractor;
use crate::image::processor::ImageProcessor;
use crate::scan::detect::{CardDetector, Detection};

/// Fields read from a card together with the detection they came from.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub fields: IdFields,
    pub detection: Detection,
}

/// Runs the card detector and hands the crop to a [`FieldExtractor`].
///
/// Unlike the detector, the reader treats a missing card
/// ([`AusweisError::CardNotDetected`]) and an unreadable card
/// ([`AusweisError::NoMrzData`]) as errors, since a caller asking for fields
/// gets nothing useful in either case.
pub struct IdReader<E> {
    detector: CardDetector,
    extractor: E,
}

impl<E: FieldExtractor> IdReader<E> {
    pub fn new(detector: CardDetector, extractor: E) -> Self {
        Self {
            detector,
            extractor,
        }
    }

    /// Decode an uploaded image (JPEG, PNG, ...) and read it.
    #[instrument(skip_all, fields(data_len = data.len()))]
    pub fn read_bytes(&self, data: &[u8]) -> Result<ReadOutcome> {
        let image = ImageProcessor::from_bytes(data)?.into_dynamic();
        self.read(&image)
    }

    /// Locate the card in `image` and extract its fields.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn read(&self, image: &DynamicImage) -> Result<ReadOutcome> {
        let Some(detection) = self.detector.detect(image)? else {
            warn!("ID card not detected");
            return Err(AusweisError::CardNotDetected);
        };

        let Some(fields) = self.extractor.extract(&detection.rectified)? else {
            warn!("No MRZ data on detected card");
            return Err(AusweisError::NoMrzData);
        };

        info!(country = ?fields.country, id_type = ?fields.id_type, "Card read");
        Ok(ReadOutcome { fields, detection })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn stub(_: &DynamicImage) -> Result<Option<IdFields>> {
        Ok(Some(IdFields {
            national_number: Some("123456".into()),
            ..Default::default()
        }))
    }

    fn nothing(_: &DynamicImage) -> Result<Option<IdFields>> {
        Ok(None)
    }

    fn card() -> DynamicImage {
        let mut img = RgbImage::new(800, 500);
        draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(600, 300), Rgb([230u8, 230, 230]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn reads_fields_from_detected_card() {
        let reader = IdReader::new(CardDetector::default(), stub);
        let outcome = reader.read(&card()).unwrap();
        assert_eq!(outcome.fields.national_number.as_deref(), Some("123456"));
        assert!(outcome.detection.aspect_ratio > 1.8);
    }

    #[test]
    fn missing_card_is_reported() {
        let reader = IdReader::new(CardDetector::default(), stub);
        let blank = DynamicImage::ImageRgb8(RgbImage::new(320, 240));
        assert!(matches!(reader.read(&blank), Err(AusweisError::CardNotDetected)));
    }

    #[test]
    fn unreadable_card_is_reported() {
        let reader = IdReader::new(CardDetector::default(), nothing);
        assert!(matches!(reader.read(&card()), Err(AusweisError::NoMrzData)));
    }

    #[test]
    fn undecodable_bytes_are_invalid_input() {
        let reader = IdReader::new(CardDetector::default(), stub);
        assert!(matches!(
            reader.read_bytes(b"definitely not an image"),
            Err(AusweisError::InvalidImage(_))
        ));
    }
}
