// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diagnostic overlay — draws the accepted outline on a copy of the input.

use ausweis_core::Corner;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

/// Outline colour for polygon-approximation hits.
pub const POLYGON_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
/// Outline colour for rotated-box fallback hits.
pub const ROTATED_BOX_COLOUR: Rgb<u8> = Rgb([0, 0, 255]);
/// Stroke width in pixels.
pub const STROKE: i32 = 3;

/// Return a copy of `image` with the closed polygon `outline` drawn on it.
pub fn draw_outline(image: &RgbImage, outline: &[Corner], colour: Rgb<u8>) -> RgbImage {
    let mut canvas = image.clone();
    if outline.len() < 2 {
        return canvas;
    }
    let half = STROKE / 2;
    for (i, &start) in outline.iter().enumerate() {
        let end = outline[(i + 1) % outline.len()];
        // Thicken by redrawing the segment on a small square of offsets.
        for dy in -half..=half {
            for dx in -half..=half {
                let (ox, oy) = (dx as f32, dy as f32);
                draw_line_segment_mut(
                    &mut canvas,
                    (start.0 + ox, start.1 + oy),
                    (end.0 + ox, end.1 + oy),
                    colour,
                );
            }
        }
    }
    canvas
}
