// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner ordering and perspective rectification.

use ausweis_core::{Corner, Quad};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument};

/// Added to the height before dividing so degenerate crops never divide by zero.
const ASPECT_EPSILON: f64 = 1e-9;

/// Quads enclosing less than this many square pixels are not warped.
const MIN_WARP_AREA: f32 = 1.0;

/// A top-down crop and the ordered corners it was taken from.
#[derive(Debug, Clone)]
pub struct Rectified {
    pub image: RgbImage,
    pub quad: Quad,
}

impl Rectified {
    /// Width / height of the crop.
    pub fn aspect_ratio(&self) -> f64 {
        aspect_ratio(self.image.width(), self.image.height())
    }
}

/// Width / height with an epsilon-guarded denominator.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    width as f64 / (height as f64 + ASPECT_EPSILON)
}

/// Put four corners into canonical `top_left, top_right, bottom_right,
/// bottom_left` order.
///
/// - top-left has the smallest `x + y`, ties going to the smaller `y`
/// - top-right has the smallest `y - x`, ties going to the larger `x`
/// - bottom-right has the largest `x + y`, ties going to the larger `y`
/// - bottom-left has the largest `y - x`, ties going to the smaller `x`
///
/// Each corner breaks ties toward its own side, so a quad rotated by exactly
/// 45 degrees still gets four distinct corners, whatever the input order.
/// Assumes a roughly convex quad rotated by no more than about 45 degrees;
/// beyond that corners can swap roles.
pub fn order_corners(points: [Corner; 4]) -> Quad {
    Quad {
        top_left: select(&points, |(x, y)| x + y, false, |a, b| a.1 < b.1),
        top_right: select(&points, |(x, y)| y - x, false, |a, b| a.0 > b.0),
        bottom_right: select(&points, |(x, y)| x + y, true, |a, b| a.1 > b.1),
        bottom_left: select(&points, |(x, y)| y - x, true, |a, b| a.0 < b.0),
    }
}

/// Extremum of `key` over `points`. `wins_tie(a, b)` decides whether `a`
/// replaces `b` when their keys are equal.
fn select(
    points: &[Corner; 4],
    key: impl Fn(Corner) -> f32,
    largest: bool,
    wins_tie: impl Fn(Corner, Corner) -> bool,
) -> Corner {
    let mut best = points[0];
    for &candidate in &points[1..] {
        let (k, kb) = (key(candidate), key(best));
        let better = if k == kb {
            wins_tie(candidate, best)
        } else if largest {
            k > kb
        } else {
            k < kb
        };
        if better {
            best = candidate;
        }
    }
    best
}

/// Output raster size for `quad`: the longer of each pair of opposite
/// sides, floored, at least 1.
pub fn target_size(quad: &Quad) -> (u32, u32) {
    let width = (quad.width().floor() as u32).max(1);
    let height = (quad.height().floor() as u32).max(1);
    (width, height)
}

/// Warp the region bounded by `points` (any order) onto an axis-aligned
/// rectangle.
///
/// A degenerate quad (collinear or coincident corners) produces a blank
/// crop instead of an error; its proportions are left for the caller's
/// aspect-ratio gate to reject.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn rectify(image: &RgbImage, points: [Corner; 4]) -> Rectified {
    let quad = order_corners(points);
    let (out_w, out_h) = target_size(&quad);

    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),                               // top-left
        ((out_w - 1) as f32, 0.0),                // top-right
        ((out_w - 1) as f32, (out_h - 1) as f32), // bottom-right
        (0.0, (out_h - 1) as f32),                // bottom-left
    ];

    let mut output = RgbImage::new(out_w, out_h);
    if quad.area() < MIN_WARP_AREA || out_w < 2 || out_h < 2 {
        debug!(area = quad.area(), "Degenerate quad; leaving crop blank");
        return Rectified { image: output, quad };
    }

    match Projection::from_control_points(quad.to_array(), dest) {
        Some(projection) => {
            warp_into(image, &projection, Interpolation::Bilinear, Rgb([0u8, 0, 0]), &mut output);
            debug!(out_w, out_h, "Perspective warp applied");
        }
        None => debug!("Projective transform is singular; leaving crop blank"),
    }

    Rectified { image: output, quad }
}
