// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary search — external contours of the edge mask and the two ways of
// turning one into a four-corner candidate.

use ausweis_core::Corner;
use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::point::Point;
use tracing::{debug, instrument};

/// A closed outer boundary found in the edge mask.
#[derive(Debug, Clone)]
pub struct Boundary {
    /// Boundary pixels in tracing order.
    pub points: Vec<Point<i32>>,
    /// Enclosed area in square pixels.
    pub area: f64,
}

impl Boundary {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        let area = polygon_area(&points);
        Self { points, area }
    }

    /// Closed perimeter length.
    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }
}

/// Collect the outermost boundaries of `mask`, largest enclosed area first.
///
/// Holes and boundaries nested inside other shapes are skipped. Boundaries of
/// equal area keep the order in which they were traced.
#[instrument(skip_all, fields(width = mask.width(), height = mask.height()))]
pub fn external_boundaries(mask: &GrayImage) -> Vec<Boundary> {
    let mut boundaries: Vec<Boundary> = find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter(|contour| !contour.points.is_empty())
        .map(|contour| Boundary::new(contour.points))
        .collect();

    boundaries.sort_by(|a, b| b.area.total_cmp(&a.area));
    debug!(count = boundaries.len(), "External boundaries found");
    boundaries
}

/// Approximate `boundary` as a polygon with tolerance `epsilon_ratio` times
/// its perimeter, returning the corners if exactly four remain.
///
/// The closed curve is split at its two mutually farthest points and each
/// half is simplified as an open chain with Douglas-Peucker, so the split
/// points (almost always true corners) are kept.
pub fn approximate_quad(boundary: &Boundary, epsilon_ratio: f64) -> Option<[Corner; 4]> {
    let polygon = approximate_polygon(boundary, epsilon_ratio)?;
    if polygon.len() != 4 {
        return None;
    }
    Some([
        to_corner(polygon[0]),
        to_corner(polygon[1]),
        to_corner(polygon[2]),
        to_corner(polygon[3]),
    ])
}

/// Douglas-Peucker approximation of a closed boundary. `None` when the
/// boundary is too small to simplify.
pub fn approximate_polygon(boundary: &Boundary, epsilon_ratio: f64) -> Option<Vec<Point<i32>>> {
    let points = &boundary.points;
    if points.len() < 3 {
        return None;
    }
    let epsilon = epsilon_ratio * boundary.perimeter();
    if epsilon.is_nan() || epsilon <= 0.0 {
        return None;
    }

    let first = farthest_from(points, points[0]);
    let second = farthest_from(points, points[first]);
    if first == second {
        return None;
    }
    let (start, end) = (first.min(second), first.max(second));

    let forward = &points[start..=end];
    let mut backward: Vec<Point<i32>> = points[end..].to_vec();
    backward.extend_from_slice(&points[..=start]);

    let mut polygon = approximate_polygon_dp(forward, epsilon, false);
    let mut tail = approximate_polygon_dp(&backward, epsilon, false);
    // Both chains share their endpoints; keep each vertex once.
    polygon.pop();
    tail.pop();
    polygon.append(&mut tail);
    Some(polygon)
}

/// Corners of the minimum-area rotated rectangle enclosing `boundary`.
///
/// Rotating calipers over the convex hull: for each hull edge, project the
/// hull onto the edge direction and its normal and keep the smallest box.
/// Corners are sub-pixel; only the hull itself is integral.
pub fn rotated_box(boundary: &Boundary) -> [Corner; 4] {
    let hull = convex_hull(boundary.points.as_slice());
    if hull.len() < 3 {
        return axis_aligned_box(&boundary.points);
    }

    let mut best: Option<(f64, [Corner; 4])> = None;
    for (i, start) in hull.iter().enumerate() {
        let end = hull[(i + 1) % hull.len()];
        let (ex, ey) = ((end.x - start.x) as f64, (end.y - start.y) as f64);
        let length = ex.hypot(ey);
        if length < f64::EPSILON {
            continue;
        }
        // Unit edge direction (ux, uy) and its normal (-uy, ux).
        let (ux, uy) = (ex / length, ey / length);

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for p in &hull {
            let (px, py) = (p.x as f64, p.y as f64);
            let u = px * ux + py * uy;
            let v = py * ux - px * uy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.is_some_and(|(best_area, _)| best_area <= area) {
            continue;
        }
        let corner = |u: f64, v: f64| ((u * ux - v * uy) as f32, (u * uy + v * ux) as f32);
        best = Some((
            area,
            [
                corner(min_u, min_v),
                corner(max_u, min_v),
                corner(max_u, max_v),
                corner(min_u, max_v),
            ],
        ));
    }

    match best {
        Some((_, corners)) => corners,
        None => axis_aligned_box(&boundary.points),
    }
}

/// Axis-aligned extent, for boundaries too small to have a hull.
fn axis_aligned_box(points: &[Point<i32>]) -> [Corner; 4] {
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0) as f32;
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0) as f32;
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0) as f32;
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0) as f32;
    [(min_x, min_y), (max_x, min_y), (max_x, max_y), (min_x, max_y)]
}

/// Shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let dist = dx * dx + dy * dy;
        if dist > best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

fn to_corner(p: Point<i32>) -> Corner {
    (p.x as f32, p.y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn rect_outline(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point<i32>> {
        let mut points = Vec::new();
        for x in x0..x1 {
            points.push(Point::new(x, y0));
        }
        for y in y0..y1 {
            points.push(Point::new(x1, y));
        }
        for x in (x0 + 1..=x1).rev() {
            points.push(Point::new(x, y1));
        }
        for y in (y0 + 1..=y1).rev() {
            points.push(Point::new(x0, y));
        }
        points
    }

    #[test]
    fn polygon_area_of_square() {
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn rectangle_outline_approximates_to_four_corners() {
        let boundary = Boundary::new(rect_outline(10, 20, 110, 70));
        let quad = approximate_quad(&boundary, 0.02).expect("rectangle should give 4 corners");
        for corner in [(10.0, 20.0), (110.0, 20.0), (110.0, 70.0), (10.0, 70.0)] {
            assert!(quad.contains(&corner), "missing corner {corner:?} in {quad:?}");
        }
    }

    #[test]
    fn tiny_boundary_is_not_approximated() {
        let boundary = Boundary::new(vec![Point::new(1, 1), Point::new(2, 1)]);
        assert!(approximate_quad(&boundary, 0.02).is_none());
    }

    #[test]
    fn rotated_box_of_axis_aligned_rectangle() {
        let boundary = Boundary::new(rect_outline(0, 0, 40, 20));
        let corners = rotated_box(&boundary);
        let mut xs: Vec<f32> = corners.iter().map(|c| c.0).collect();
        let mut ys: Vec<f32> = corners.iter().map(|c| c.1).collect();
        xs.sort_by(f32::total_cmp);
        ys.sort_by(f32::total_cmp);
        assert_eq!((xs[0], xs[3]), (0.0, 40.0));
        assert_eq!((ys[0], ys[3]), (0.0, 20.0));
    }

    #[test]
    fn rotated_box_keeps_sub_pixel_corners() {
        // The tightest box lies along one of the triangle's edges (area 3),
        // not the axes (area 4), and has non-integer corners.
        let triangle = Boundary::new(vec![Point::new(0, 0), Point::new(2, 1), Point::new(1, 2)]);
        let corners = rotated_box(&triangle);
        let as_points: Vec<Point<f64>> = corners
            .iter()
            .map(|&(x, y)| Point::new(x as f64, y as f64))
            .collect();
        let twice_area: f64 = (0..4)
            .map(|i| {
                let (a, b) = (as_points[i], as_points[(i + 1) % 4]);
                a.x * b.y - b.x * a.y
            })
            .sum();
        assert!((twice_area.abs() / 2.0 - 3.0).abs() < 1e-3, "corners {corners:?}");
        assert!(
            corners.iter().any(|c| c.0.fract() != 0.0 || c.1.fract() != 0.0),
            "corners {corners:?}"
        );
    }

    #[test]
    fn rotated_box_of_tilted_rectangle_matches_its_sides() {
        // Rectangle with sides along (4, 3) and (-3, 4): 50 by 25 px.
        let corners = [Point::new(10, 10), Point::new(50, 40), Point::new(35, 60), Point::new(-5, 30)];
        let boundary = Boundary::new(corners.to_vec());
        let quad = rotated_box(&boundary);
        let side = |a: Corner, b: Corner| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
        let mut sides = [side(quad[0], quad[1]), side(quad[1], quad[2])];
        sides.sort_by(f32::total_cmp);
        assert!((sides[0] - 25.0).abs() < 1e-3 && (sides[1] - 50.0).abs() < 1e-3, "{sides:?}");
    }

    #[test]
    fn boundaries_are_sorted_largest_first_and_external_only() {
        let mut mask = GrayImage::new(300, 200);
        // A hollow frame (outer border + hole) and a small solid blob.
        draw_filled_rect_mut(&mut mask, Rect::at(20, 20).of_size(200, 150), Luma([255u8]));
        draw_filled_rect_mut(&mut mask, Rect::at(30, 30).of_size(180, 130), Luma([0u8]));
        draw_filled_rect_mut(&mut mask, Rect::at(80, 80).of_size(20, 20), Luma([255u8]));
        draw_filled_circle_mut(&mut mask, (260, 40), 15, Luma([255u8]));

        let boundaries = external_boundaries(&mask);
        // The blob inside the frame's hole is nested, so only the frame and
        // the circle are external.
        assert_eq!(boundaries.len(), 2);
        assert!(boundaries[0].area > boundaries[1].area);
        assert!((boundaries[0].area - 199.0 * 149.0).abs() < 1.0);
    }

    #[test]
    fn empty_mask_has_no_boundaries() {
        assert!(external_boundaries(&GrayImage::new(50, 50)).is_empty());
    }
}
