// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quad selection — pick the most plausible four-sided candidate from the
// area-ranked contour list.

use flatscan_core::error::{Result, ScanError};
use flatscan_core::types::{CandidateContour, Quadrilateral, SelectionPolicy};
use tracing::{debug, instrument};

use super::detect::PolygonApproximator;

/// The winning candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Simplified four-vertex outline, in the detector's coordinate space.
    pub quad: Quadrilateral,
    /// Zero-based position of the winner in the ranked candidate list.
    pub rank: usize,
    /// Enclosed area reported by the detector.
    pub area: f64,
}

/// Walks area-ranked candidates and returns the first (or largest) one whose
/// polygon approximation has exactly four vertices.
#[derive(Debug, Clone, Copy)]
pub struct QuadSelector {
    /// Candidates examined under the greedy policy.
    pub cap: usize,
    /// Approximation tolerance as a fraction of each candidate's perimeter.
    pub tolerance: f64,
    pub policy: SelectionPolicy,
}

impl Default for QuadSelector {
    fn default() -> Self {
        Self {
            cap: 5,
            tolerance: 0.02,
            policy: SelectionPolicy::GreedyFirstK,
        }
    }
}

impl QuadSelector {
    pub fn new(cap: usize, tolerance: f64, policy: SelectionPolicy) -> Self {
        Self {
            cap,
            tolerance,
            policy,
        }
    }

    /// Select a quadrilateral from `candidates`, which must already be sorted
    /// by descending area.
    ///
    /// Returns [`ScanError::NoQuadFound`] when nothing qualifies. That is a
    /// normal outcome: the scan pipeline falls back to the unrectified image.
    #[instrument(skip_all, fields(candidates = candidates.len(), policy = ?self.policy))]
    pub fn select(
        &self,
        candidates: &[CandidateContour],
        approximator: &dyn PolygonApproximator,
    ) -> Result<Selection> {
        let selection = match self.policy {
            SelectionPolicy::GreedyFirstK => self.greedy(candidates, approximator),
            SelectionPolicy::ExhaustiveMaxArea => self.exhaustive(candidates, approximator),
        };
        match selection {
            Some(sel) => {
                debug!(rank = sel.rank, area = sel.area, "Quadrilateral selected");
                Ok(sel)
            }
            None => {
                debug!("No four-vertex candidate");
                Err(ScanError::NoQuadFound)
            }
        }
    }

    fn greedy(
        &self,
        candidates: &[CandidateContour],
        approximator: &dyn PolygonApproximator,
    ) -> Option<Selection> {
        candidates
            .iter()
            .take(self.cap)
            .enumerate()
            .find_map(|(rank, contour)| self.try_quad(rank, contour, approximator))
    }

    fn exhaustive(
        &self,
        candidates: &[CandidateContour],
        approximator: &dyn PolygonApproximator,
    ) -> Option<Selection> {
        candidates
            .iter()
            .enumerate()
            .filter_map(|(rank, contour)| self.try_quad(rank, contour, approximator))
            // Strictly-greater keeps the earliest-ranked of equal areas.
            .fold(None, |best: Option<Selection>, sel| match best {
                Some(b) if b.area >= sel.area => Some(b),
                _ => Some(sel),
            })
    }

    fn try_quad(
        &self,
        rank: usize,
        contour: &CandidateContour,
        approximator: &dyn PolygonApproximator,
    ) -> Option<Selection> {
        let approx = approximator.approximate_polygon(contour, self.tolerance);
        debug!(rank, area = contour.area, vertices = approx.len(), "Candidate simplified");
        let quad = Quadrilateral::from_slice(&approx).ok()?;
        Some(Selection {
            quad,
            rank,
            area: contour.area,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatscan_core::types::Point2D;

    /// Approximator that reports a preset vertex count per candidate,
    /// keyed by the contour's area.
    struct FixedCounts(Vec<(f64, usize)>);

    impl PolygonApproximator for FixedCounts {
        fn approximate_polygon(&self, contour: &CandidateContour, _tol: f64) -> Vec<Point2D> {
            let n = self
                .0
                .iter()
                .find(|(area, _)| *area == contour.area)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            (0..n)
                .map(|i| Point2D::new(i as f64 * 10.0, (i * i) as f64))
                .collect()
        }
    }

    fn ranked(areas: &[f64]) -> Vec<CandidateContour> {
        areas
            .iter()
            .map(|&a| CandidateContour::new(vec![Point2D::default(); 8], a))
            .collect()
    }

    #[test]
    fn greedy_returns_only_four_vertex_candidate() {
        let candidates = ranked(&[500.0, 400.0, 300.0, 200.0, 100.0]);
        let approx = FixedCounts(vec![
            (500.0, 6),
            (400.0, 3),
            (300.0, 4),
            (200.0, 5),
            (100.0, 8),
        ]);
        let sel = QuadSelector::default().select(&candidates, &approx).unwrap();
        assert_eq!(sel.rank, 2);
        assert_eq!(sel.area, 300.0);
    }

    #[test]
    fn greedy_takes_first_match_not_largest_later() {
        let candidates = ranked(&[500.0, 400.0, 300.0]);
        let approx = FixedCounts(vec![(500.0, 7), (400.0, 4), (300.0, 4)]);
        let sel = QuadSelector::default().select(&candidates, &approx).unwrap();
        assert_eq!(sel.rank, 1);
    }

    #[test]
    fn no_four_vertex_candidate_is_not_found() {
        let candidates = ranked(&[500.0, 400.0, 300.0, 200.0, 100.0]);
        let approx = FixedCounts(vec![
            (500.0, 6),
            (400.0, 3),
            (300.0, 5),
            (200.0, 7),
            (100.0, 12),
        ]);
        assert!(matches!(
            QuadSelector::default().select(&candidates, &approx),
            Err(ScanError::NoQuadFound)
        ));
    }

    #[test]
    fn cap_hides_sixth_candidate() {
        let candidates = ranked(&[600.0, 500.0, 400.0, 300.0, 200.0, 100.0]);
        let approx = FixedCounts(vec![(100.0, 4)]);
        assert!(QuadSelector::default().select(&candidates, &approx).is_err());

        let exhaustive = QuadSelector::new(5, 0.02, SelectionPolicy::ExhaustiveMaxArea);
        assert_eq!(exhaustive.select(&candidates, &approx).unwrap().rank, 5);
    }

    #[test]
    fn exhaustive_prefers_largest_area() {
        // Not sorted: the exhaustive policy does not rely on ranking.
        let candidates = ranked(&[300.0, 900.0, 500.0]);
        let approx = FixedCounts(vec![(300.0, 4), (900.0, 4), (500.0, 4)]);
        let selector = QuadSelector::new(1, 0.02, SelectionPolicy::ExhaustiveMaxArea);
        let sel = selector.select(&candidates, &approx).unwrap();
        assert_eq!(sel.rank, 1);
        assert_eq!(sel.area, 900.0);
    }

    #[test]
    fn empty_candidates_not_found() {
        let approx = FixedCounts(Vec::new());
        assert!(QuadSelector::default().select(&[], &approx).is_err());
    }
}
