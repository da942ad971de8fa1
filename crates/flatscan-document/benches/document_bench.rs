// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the flatscan-document crate: the full scan on a
// synthetic photographed page, and the homography warp on its own.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use flatscan_core::{DestinationRect, Point2D, PointOrderer, Quadrilateral};
use flatscan_document::ScanPipeline;
use flatscan_document::scan::HomographyRectifier;

const PAGE: [(i32, i32); 4] = [(150, 120), (640, 180), (600, 880), (110, 820)];

/// 800x1000 dark background with a bright, slightly rotated sheet.
fn synthetic_page() -> DynamicImage {
    let mut img = RgbImage::from_pixel(800, 1000, Rgb([30, 30, 35]));
    let corners = PAGE.map(|(x, y)| Point::new(x, y));
    draw_polygon_mut(&mut img, &corners, Rgb([230, 228, 225]));
    DynamicImage::ImageRgb8(img)
}

fn bench_full_scan(c: &mut Criterion) {
    let page = synthetic_page();
    let pipeline = ScanPipeline::default();

    c.bench_function("scan (800x1000)", |b| {
        b.iter(|| {
            let outcome = pipeline.scan(black_box(&page));
            black_box(outcome.ok());
        });
    });
}

fn bench_rectify(c: &mut Criterion) {
    let page = synthetic_page();
    let quad = PointOrderer::order(&Quadrilateral(
        PAGE.map(|(x, y)| Point2D::new(x as f64, y as f64)),
    ));
    let rect = DestinationRect::new(494, 701);
    let rectifier = HomographyRectifier::default();

    c.bench_function("rectify bilinear (494x701)", |b| {
        b.iter(|| {
            let warped = rectifier.rectify(black_box(&page), &quad, rect);
            black_box(warped.ok());
        });
    });
}

criterion_group!(benches, bench_full_scan, bench_rectify);
criterion_main!(benches);
