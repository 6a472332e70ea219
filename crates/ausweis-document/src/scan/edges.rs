// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge extraction — turns a grayscale photo into a binary mask in which the
// card border forms one closed boundary.

use ausweis_core::DetectorConfig;
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{dilate, erode};
use tracing::{debug, instrument};

/// Produce the binary edge mask for `gray`.
///
/// ## Pipeline
///
/// 1. Gaussian blur to suppress texture that would fragment the border
/// 2. Canny edge detection (edge pixels are 255, everything else 0)
/// 3. Morphological closing with a square structuring element so small
///    gaps in the border are bridged
///
/// Never fails: a featureless image yields an all-zero mask.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn extract_edges(gray: &GrayImage, config: &DetectorConfig) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, config.blur_sigma);
    let edges = canny(&blurred, config.canny_low, config.canny_high);
    debug!(
        sigma = config.blur_sigma,
        low = config.canny_low,
        high = config.canny_high,
        "Canny edge detection complete"
    );
    close_gaps(&edges, config.close_radius, config.close_iterations)
}

/// Dilate then erode `mask`, `iterations` times each, with a square element
/// of half-width `radius`.
///
/// Under the L-infinity norm, `n` dilations by a square of radius `r` equal a
/// single dilation of radius `n * r` (and likewise for erosion), so the
/// closing runs as one pass of each.
pub fn close_gaps(mask: &GrayImage, radius: u8, iterations: u8) -> GrayImage {
    let k = radius.saturating_mul(iterations);
    if k == 0 {
        return mask.clone();
    }
    let dilated = dilate(mask, Norm::LInf, k);
    erode(&dilated, Norm::LInf, k)
}
