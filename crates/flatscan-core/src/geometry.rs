// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner ordering and destination sizing for a recovered document quad.
// Pure geometry: no pixels are touched here.

use crate::types::{DestinationRect, OrderedQuad, Point2D, Quadrilateral};

/// Canonicalises four unordered points into top-left, top-right,
/// bottom-right, bottom-left.
///
/// Uses the sum/difference heuristic: the top-left corner minimises `x + y`,
/// bottom-right maximises it; top-right minimises `y - x` and bottom-left
/// maximises it. All four roles are chosen from the full point set. This is
/// exact for convex quads rotated less than 90 degrees from upright.
///
/// Ties (possible only for degenerate or 45-degree square inputs) resolve to
/// the first point in input order, so the result is deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointOrderer;

impl PointOrderer {
    pub fn order(quad: &Quadrilateral) -> OrderedQuad {
        let pts = quad.points();

        let top_left = pick(pts, |p| p.sum(), Extreme::Min);
        let bottom_right = pick(pts, |p| p.sum(), Extreme::Max);
        let top_right = pick(pts, |p| p.diff(), Extreme::Min);
        let bottom_left = pick(pts, |p| p.diff(), Extreme::Max);

        OrderedQuad::new(top_left, top_right, bottom_right, bottom_left)
    }
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

/// First point (in input order) holding the extreme value of `key`.
fn pick(points: &[Point2D; 4], key: impl Fn(&Point2D) -> f64, extreme: Extreme) -> Point2D {
    let mut best = points[0];
    let mut best_key = key(&best);
    for p in &points[1..] {
        let k = key(p);
        let better = match extreme {
            Extreme::Min => k < best_key,
            Extreme::Max => k > best_key,
        };
        if better {
            best = *p;
            best_key = k;
        }
    }
    best
}

/// Computes the output rectangle for an ordered quad.
///
/// Width is the longer of the top and bottom edges, height the longer of the
/// left and right edges. The far edge of a tilted page is foreshortened, so
/// the longer measurement is the better estimate of the true side.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectangleSizer;

impl RectangleSizer {
    pub fn size(quad: &OrderedQuad) -> DestinationRect {
        let bottom = quad.bottom_right().distance(&quad.bottom_left());
        let top = quad.top_right().distance(&quad.top_left());
        let right = quad.top_right().distance(&quad.bottom_right());
        let left = quad.top_left().distance(&quad.bottom_left());

        let width = bottom.max(top).round();
        let height = right.max(left).round();

        DestinationRect::new(to_pixels(width), to_pixels(height))
    }
}

fn to_pixels(length: f64) -> u32 {
    if length.is_finite() && length > 0.0 {
        length.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    /// Corners of a `w` x `h` rectangle centred at (500, 500) rotated by
    /// `degrees`, listed TL, TR, BR, BL in the unrotated frame.
    fn rotated_rect(w: f64, h: f64, degrees: f64) -> [Point2D; 4] {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (hw, hh) = (w / 2.0, h / 2.0);
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(x, y)| {
            p(500.0 + x * cos - y * sin, 500.0 + x * sin + y * cos)
        })
    }

    /// All 24 orderings of four items.
    fn permutations(items: [Point2D; 4]) -> Vec<[Point2D; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut seen = [false; 4];
                        if idx.iter().all(|&i| !std::mem::replace(&mut seen[i], true)) {
                            out.push(idx.map(|i| items[i]));
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn orders_axis_aligned_rectangle() {
        let quad = Quadrilateral([p(100.0, 0.0), p(0.0, 50.0), p(0.0, 0.0), p(100.0, 50.0)]);
        let ordered = PointOrderer::order(&quad);
        assert_eq!(ordered.top_left(), p(0.0, 0.0));
        assert_eq!(ordered.top_right(), p(100.0, 0.0));
        assert_eq!(ordered.bottom_right(), p(100.0, 50.0));
        assert_eq!(ordered.bottom_left(), p(0.0, 50.0));
    }

    #[test]
    fn ordering_is_permutation_invariant() {
        for degrees in [0.0, 5.0, 15.0, 30.0, 60.0, 75.0, 89.0] {
            let corners = rotated_rect(300.0, 180.0, degrees);
            let expected = PointOrderer::order(&Quadrilateral(corners));
            for perm in permutations(corners) {
                assert_eq!(
                    PointOrderer::order(&Quadrilateral(perm)),
                    expected,
                    "rotation {degrees} permutation {perm:?}"
                );
            }
        }
    }

    #[test]
    fn small_rotation_keeps_semantic_corners() {
        let corners = rotated_rect(300.0, 180.0, 10.0);
        let ordered = PointOrderer::order(&Quadrilateral([
            corners[2], corners[0], corners[3], corners[1],
        ]));
        assert_eq!(ordered.corners(), corners);
    }

    #[test]
    fn perspective_trapezoid_is_ordered() {
        // Far (top) edge foreshortened.
        let quad = Quadrilateral([p(60.0, 20.0), p(10.0, 200.0), p(240.0, 20.0), p(290.0, 200.0)]);
        let ordered = PointOrderer::order(&quad);
        assert_eq!(ordered.top_left(), p(60.0, 20.0));
        assert_eq!(ordered.top_right(), p(240.0, 20.0));
        assert_eq!(ordered.bottom_right(), p(290.0, 200.0));
        assert_eq!(ordered.bottom_left(), p(10.0, 200.0));
    }

    #[test]
    fn ties_resolve_to_first_occurrence() {
        // Square rotated 45 degrees: top and left corners tie on x + y.
        let top = p(50.0, 0.0);
        let left = p(0.0, 50.0);
        let quad_a = Quadrilateral([top, p(100.0, 50.0), p(50.0, 100.0), left]);
        let quad_b = Quadrilateral([left, p(100.0, 50.0), p(50.0, 100.0), top]);
        assert_eq!(PointOrderer::order(&quad_a).top_left(), top);
        assert_eq!(PointOrderer::order(&quad_b).top_left(), left);
    }

    #[test]
    fn axis_aligned_rectangle_sizes_exactly() {
        let quad = Quadrilateral([p(0.0, 0.0), p(640.0, 0.0), p(640.0, 480.0), p(0.0, 480.0)]);
        let rect = RectangleSizer::size(&PointOrderer::order(&quad));
        assert_eq!(rect, DestinationRect { width: 640, height: 480 });
    }

    #[test]
    fn sizer_takes_longer_of_each_pair() {
        let quad = Quadrilateral([p(60.0, 20.0), p(240.0, 20.0), p(290.0, 200.0), p(10.0, 200.0)]);
        let rect = RectangleSizer::size(&PointOrderer::order(&quad));
        // Bottom edge 280 beats top edge 180; slanted sides are ~186.8.
        assert_eq!(rect.width, 280);
        assert_eq!(rect.height, 187);
    }

    #[test]
    fn collapsed_quad_still_has_one_pixel() {
        let quad = Quadrilateral([p(5.0, 5.0); 4]);
        let rect = RectangleSizer::size(&PointOrderer::order(&quad));
        assert_eq!(rect, DestinationRect { width: 1, height: 1 });
    }
}
