// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Imaging collaborators for quad recovery: edge preparation, contour tracing
// and polygon simplification. Each sits behind a trait so callers can plug in
// their own detector.

use flatscan_core::types::{CandidateContour, Point2D};
use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use tracing::{debug, instrument};

/// Produces closed candidate contours from a binary edge image.
pub trait ContourDetector: Send + Sync {
    /// Contours sorted by descending enclosed area.
    fn detect_contours(&self, edges: &GrayImage) -> Vec<CandidateContour>;
}

/// Simplifies a dense contour to its dominant vertices.
pub trait PolygonApproximator: Send + Sync {
    /// `tolerance_fraction` is the allowed deviation as a fraction of the
    /// contour's closed perimeter.
    fn approximate_polygon(&self, contour: &CandidateContour, tolerance_fraction: f64)
    -> Vec<Point2D>;
}

// -- Edge preparation ---------------------------------------------------------

/// Blur, Canny and a one-pixel dilation that closes hairline gaps in the page
/// outline.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn prepare_edges(gray: &GrayImage, sigma: f32, low: f32, high: f32) -> GrayImage {
    let blurred = if sigma > 0.0 {
        gaussian_blur_f32(gray, sigma)
    } else {
        gray.clone()
    };
    let edges = canny(&blurred, low, high);
    let closed = dilate(&edges, Norm::LInf, 1);
    debug!(
        edge_pixels = closed.pixels().filter(|p| p.0[0] > 0).count(),
        "Edge map ready"
    );
    closed
}

// -- Contour tracing ----------------------------------------------------------

/// Border-following contour detector over a binary edge map.
///
/// Every border is reported, outer and hole alike, ranked by shoelace area.
/// Borders enclosing no area are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeContourDetector;

impl ContourDetector for EdgeContourDetector {
    fn detect_contours(&self, edges: &GrayImage) -> Vec<CandidateContour> {
        let mut candidates: Vec<CandidateContour> = find_contours::<i32>(edges)
            .into_iter()
            .filter(|c| c.points.len() >= 3)
            .map(|c| {
                CandidateContour::from_points(
                    c.points
                        .iter()
                        .map(|p| Point2D::new(p.x as f64, p.y as f64))
                        .collect(),
                )
            })
            .filter(|c| c.area > 0.0)
            .collect();

        candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
        debug!(count = candidates.len(), "Contours traced");
        candidates
    }
}

// -- Polygon simplification ---------------------------------------------------

/// Ramer–Douglas–Peucker simplification for closed curves.
///
/// The curve is split at the vertex farthest from its first point, each half
/// is simplified as an open chain, and the joined ring is pruned of vertices
/// that lie within tolerance of their neighbours' chord. The result never
/// repeats its first vertex, so a clean quadrilateral yields exactly four
/// points.
#[derive(Debug, Clone, Copy, Default)]
pub struct DouglasPeucker;

impl PolygonApproximator for DouglasPeucker {
    fn approximate_polygon(
        &self,
        contour: &CandidateContour,
        tolerance_fraction: f64,
    ) -> Vec<Point2D> {
        let epsilon = tolerance_fraction * contour.perimeter();
        simplify_closed(&contour.points, epsilon)
    }
}

pub(crate) fn simplify_closed(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let n = points.len();
    if n < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let anchor = points[0];
    let (far, _) = points
        .iter()
        .enumerate()
        .skip(1)
        .fold((0, 0.0), |best, (i, p)| {
            let d = anchor.distance(p);
            if d > best.1 { (i, d) } else { best }
        });
    if far == 0 {
        return vec![anchor];
    }

    let mut second: Vec<Point2D> = points[far..].to_vec();
    second.push(anchor);

    let mut ring = simplify_open(&points[..=far], epsilon);
    ring.pop();
    ring.extend(simplify_open(&second, epsilon));
    ring.pop();

    prune_ring(ring, epsilon)
}

fn simplify_open(chain: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    if chain.len() < 3 {
        return chain.to_vec();
    }
    let (start, end) = (chain[0], chain[chain.len() - 1]);

    let (index, dmax) = chain[1..chain.len() - 1]
        .iter()
        .enumerate()
        .fold((0, 0.0), |best, (i, p)| {
            let d = segment_distance(p, &start, &end);
            if d > best.1 { (i + 1, d) } else { best }
        });

    if dmax > epsilon {
        let mut left = simplify_open(&chain[..=index], epsilon);
        left.pop();
        left.extend(simplify_open(&chain[index..], epsilon));
        left
    } else {
        vec![start, end]
    }
}

/// Drop ring vertices that sit within `epsilon` of the chord joining their
/// neighbours. Handles an anchor that happened to fall mid-edge.
fn prune_ring(mut ring: Vec<Point2D>, epsilon: f64) -> Vec<Point2D> {
    loop {
        let n = ring.len();
        if n <= 3 {
            return ring;
        }
        let flat = (0..n).find(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            segment_distance(&ring[i], &prev, &next) <= epsilon
        });
        match flat {
            Some(i) => {
                ring.remove(i);
            }
            None => return ring,
        }
    }
}

/// Distance from `p` to the segment `a`–`b`.
fn segment_distance(p: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point2D::new(a.x + t * dx, a.y + t * dy))
}
