// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the ausweis-document crate.
// Covers the full card detection pipeline and the rectification step on
// synthetic photos.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use ausweis_document::CardDetector;
use ausweis_document::scan::rectify;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 800x500 grey background with a slightly rotated light card.
fn synthetic_photo() -> RgbImage {
    let mut img = RgbImage::from_pixel(800, 500, Rgb([40, 40, 40]));
    let card = [
        Point::new(120, 130),
        Point::new(680, 90),
        Point::new(700, 370),
        Point::new(140, 410),
    ];
    draw_polygon_mut(&mut img, &card, Rgb([235, 230, 220]));
    img
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Edge extraction, boundary search, and warp on an 800x500 photo.
fn bench_detect(c: &mut Criterion) {
    let photo = DynamicImage::ImageRgb8(synthetic_photo());
    let detector = CardDetector::default();

    c.bench_function("detect (800x500)", |b| {
        b.iter(|| {
            let detection = detector.detect(black_box(&photo));
            black_box(detection.ok().flatten());
        });
    });
}

/// Perspective warp alone, given known corners.
fn bench_rectify(c: &mut Criterion) {
    let photo = synthetic_photo();
    let corners = [(680.0, 90.0), (140.0, 410.0), (120.0, 130.0), (700.0, 370.0)];

    c.bench_function("rectify (800x500)", |b| {
        b.iter(|| {
            let rectified = rectify::rectify(black_box(&photo), black_box(corners));
            black_box(rectified.image);
        });
    });
}

criterion_group!(benches, bench_detect, bench_rectify);
criterion_main!(benches);
