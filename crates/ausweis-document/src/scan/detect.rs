// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card localisation — finds the ID card in a photo and returns a top-down crop.

use ausweis_core::error::Result;
use ausweis_core::{Corner, DetectorConfig, Quad};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ensure_raster;
use crate::scan::contours::{self, Boundary};
use crate::scan::edges::extract_edges;
use crate::scan::overlay::{self, POLYGON_COLOUR, ROTATED_BOX_COLOUR};
use crate::scan::rectify::{Rectified, rectify};

/// Which search pass produced the accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePath {
    /// The boundary approximated to exactly four vertices.
    Polygon,
    /// Corners of the boundary's minimum-area rotated rectangle.
    RotatedBox,
}

/// A located and rectified card.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Top-down crop of the card.
    pub rectified: DynamicImage,
    /// Card corners in the input image, canonically ordered.
    pub quad: Quad,
    /// Pass that produced the candidate.
    pub path: CandidatePath,
    /// Width / height of `rectified`.
    pub aspect_ratio: f64,
    /// Enclosed area of the boundary the candidate came from.
    pub boundary_area: f64,
    /// Copy of the input with the accepted outline drawn on it, when the
    /// detector runs with `debug` enabled.
    pub debug: Option<DynamicImage>,
}

/// Locates a rectangular card in a photograph.
///
/// Stateless apart from its configuration: one detector can serve any number
/// of images, from any number of threads.
///
/// ```ignore
/// let detector = CardDetector::new(DetectorConfig::default())?;
/// if let Some(card) = detector.detect(&image::open("id.jpg")?)? {
///     card.rectified.save("card.png")?;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CardDetector {
    config: DetectorConfig,
}

impl CardDetector {
    /// Create a detector, rejecting invalid settings.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Find the card in `image` and rectify it.
    ///
    /// ## Search
    ///
    /// 1. Extract the closed edge mask and its external boundaries, largest
    ///    area first
    /// 2. Drop boundaries smaller than `max(min_area_floor, min_area_ratio * image area)`
    /// 3. Primary pass: boundaries whose polygon approximation has exactly
    ///    four vertices
    /// 4. Fallback pass: the minimum-area rotated rectangle of every boundary
    ///
    /// In each pass the first candidate whose rectified aspect ratio falls in
    /// `aspect_range` wins.
    ///
    /// Returns `Ok(None)` when no candidate passes, and
    /// [`ausweis_core::AusweisError::InvalidImage`] only for an empty raster.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &DynamicImage) -> Result<Option<Detection>> {
        if let Err(err) = ensure_raster(image) {
            warn!(%err, "Rejecting input");
            return Err(err);
        }
        let (width, height) = (image.width(), image.height());

        let rgb = image.to_rgb8();
        let edges = extract_edges(&image.to_luma8(), &self.config);
        let min_area = self.config.min_area(width, height);

        // Sorted by area, so everything after the first small one is small too.
        let boundaries: Vec<Boundary> = contours::external_boundaries(&edges)
            .into_iter()
            .take_while(|boundary| boundary.area >= min_area)
            .collect();
        debug!(candidates = boundaries.len(), min_area, "Boundaries above minimum area");

        let found = self
            .search(&rgb, &boundaries, CandidatePath::Polygon)
            .or_else(|| self.search(&rgb, &boundaries, CandidatePath::RotatedBox));

        let Some((rectified, outline, path, boundary_area)) = found else {
            info!("No card-shaped boundary found");
            return Ok(None);
        };

        let aspect_ratio = rectified.aspect_ratio();
        info!(
            ?path,
            aspect_ratio,
            out_w = rectified.image.width(),
            out_h = rectified.image.height(),
            "Card detected"
        );

        let debug = self.config.debug.then(|| {
            let colour = match path {
                CandidatePath::Polygon => POLYGON_COLOUR,
                CandidatePath::RotatedBox => ROTATED_BOX_COLOUR,
            };
            DynamicImage::ImageRgb8(overlay::draw_outline(&rgb, &outline, colour))
        });

        Ok(Some(Detection {
            rectified: DynamicImage::ImageRgb8(rectified.image),
            quad: rectified.quad,
            path,
            aspect_ratio,
            boundary_area,
            debug,
        }))
    }

    /// Run one pass over `boundaries`, returning the first candidate that
    /// passes the aspect-ratio gate together with the outline it came from.
    fn search(
        &self,
        image: &RgbImage,
        boundaries: &[Boundary],
        path: CandidatePath,
    ) -> Option<(Rectified, [Corner; 4], CandidatePath, f64)> {
        for (index, boundary) in boundaries.iter().enumerate() {
            let corners = match path {
                CandidatePath::Polygon => {
                    match contours::approximate_quad(boundary, self.config.approx_epsilon_ratio) {
                        Some(corners) => corners,
                        None => continue,
                    }
                }
                CandidatePath::RotatedBox => contours::rotated_box(boundary),
            };

            let rectified = rectify(image, corners);
            let ratio = rectified.aspect_ratio();
            let accepted = self.config.aspect_range.contains(ratio);
            debug!(
                index,
                ?path,
                area = boundary.area,
                aspect_ratio = ratio,
                accepted,
                "Candidate evaluated"
            );
            if accepted {
                return Some((rectified, corners, path, boundary.area));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ausweis_core::AusweisError;
    use image::{GrayImage, Luma, Rgb};
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn card_on_black() -> DynamicImage {
        let mut img = RgbImage::new(800, 500);
        draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(600, 300), Rgb([255u8, 255, 255]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn empty_raster_is_invalid_input() {
        let detector = CardDetector::default();
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(detector.detect(&empty), Err(AusweisError::InvalidImage(_))));
    }

    #[test]
    fn black_image_yields_nothing() {
        let detector = CardDetector::default();
        let black = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        assert!(detector.detect(&black).unwrap().is_none());
    }

    #[test]
    fn finds_card_via_polygon_path() {
        let detector = CardDetector::default();
        let card = detector.detect(&card_on_black()).unwrap().expect("card should be found");
        assert_eq!(card.path, CandidatePath::Polygon);
        assert!((card.aspect_ratio - 2.0).abs() < 0.1, "aspect {}", card.aspect_ratio);
        assert!((card.quad.top_left.0 - 100.0).abs() < 6.0);
        assert!((card.quad.top_left.1 - 100.0).abs() < 6.0);
        assert!((card.quad.bottom_right.0 - 700.0).abs() < 6.0);
        assert!(card.debug.is_none());
    }

    #[test]
    fn debug_overlay_is_returned_on_request() {
        let detector = CardDetector::new(DetectorConfig::default().with_debug(true)).unwrap();
        let input = card_on_black();
        let card = detector.detect(&input).unwrap().expect("card should be found");
        let overlay = card.debug.expect("debug overlay requested").to_rgb8();
        assert_eq!(overlay.dimensions(), (800, 500));
        let green = overlay.pixels().filter(|p| **p == POLYGON_COLOUR).count();
        assert!(green > 1000, "only {green} outline pixels");
        // The input itself is never annotated.
        assert!(input.to_rgb8().pixels().all(|p| *p != POLYGON_COLOUR));
    }

    #[test]
    fn circle_is_rejected() {
        let mut img = GrayImage::new(600, 600);
        draw_filled_circle_mut(&mut img, (300, 300), 240, Luma([255u8]));
        let detector = CardDetector::default();
        assert!(detector.detect(&DynamicImage::ImageLuma8(img)).unwrap().is_none());
    }

    #[test]
    fn shapes_below_min_area_are_ignored() {
        let mut img = RgbImage::new(800, 500);
        // 60x30 = 1800 px, below 1% of 400k px.
        draw_filled_rect_mut(&mut img, Rect::at(300, 200).of_size(60, 30), Rgb([255u8, 255, 255]));
        let detector = CardDetector::default();
        assert!(detector.detect(&DynamicImage::ImageRgb8(img)).unwrap().is_none());
    }

    #[test]
    fn narrow_aspect_range_rejects_card() {
        let config = DetectorConfig::default().with_aspect_range(2.5, 2.8);
        let detector = CardDetector::new(config).unwrap();
        assert!(detector.detect(&card_on_black()).unwrap().is_none());
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = DetectorConfig::default().with_aspect_range(3.0, 1.0);
        assert!(matches!(CardDetector::new(config), Err(AusweisError::Config(_))));
    }
}
