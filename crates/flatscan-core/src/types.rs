// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Flatscan quadrilateral-recovery pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// A real-valued image coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// `x + y`, smallest at the top-left corner of an upright page.
    pub fn sum(&self) -> f64 {
        self.x + self.y
    }

    /// `y - x`, smallest at the top-right corner of an upright page.
    pub fn diff(&self) -> f64 {
        self.y - self.x
    }

    /// Multiply both coordinates by `ratio`.
    pub fn scale(&self, ratio: f64) -> Self {
        Self::new(self.x * ratio, self.y * ratio)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Exactly four points, in whatever order the detector produced them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral(pub [Point2D; 4]);

impl Quadrilateral {
    /// Build a quadrilateral from a vertex list that must hold exactly four
    /// points.
    pub fn from_slice(points: &[Point2D]) -> Result<Self> {
        let corners: [Point2D; 4] = points.try_into().map_err(|_| {
            ScanError::InvalidInput(format!(
                "a quadrilateral needs exactly 4 points, got {}",
                points.len()
            ))
        })?;
        Ok(Self(corners))
    }

    pub fn points(&self) -> &[Point2D; 4] {
        &self.0
    }

    /// Multiply every vertex by `ratio`.
    pub fn scale(&self, ratio: f64) -> Self {
        Self(self.0.map(|p| p.scale(ratio)))
    }
}

/// A quadrilateral whose corners carry a fixed semantic order.
///
/// Only produced by [`crate::geometry::PointOrderer`]; there is no public
/// constructor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderedQuad {
    top_left: Point2D,
    top_right: Point2D,
    bottom_right: Point2D,
    bottom_left: Point2D,
}

impl OrderedQuad {
    pub(crate) fn new(
        top_left: Point2D,
        top_right: Point2D,
        bottom_right: Point2D,
        bottom_left: Point2D,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn top_left(&self) -> Point2D {
        self.top_left
    }

    pub fn top_right(&self) -> Point2D {
        self.top_right
    }

    pub fn bottom_right(&self) -> Point2D {
        self.bottom_right
    }

    pub fn bottom_left(&self) -> Point2D {
        self.bottom_left
    }

    /// Corners as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn corners(&self) -> [Point2D; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Rescale every corner, e.g. from a downscaled working copy back to
    /// source resolution. A uniform positive scale preserves the ordering.
    pub fn scale(&self, ratio: f64) -> Self {
        Self::new(
            self.top_left.scale(ratio),
            self.top_right.scale(ratio),
            self.bottom_right.scale(ratio),
            self.bottom_left.scale(ratio),
        )
    }
}

/// Integer pixel dimensions of the rectified output. Both sides are >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestinationRect {
    pub width: u32,
    pub height: u32,
}

impl DestinationRect {
    /// Clamp each side to at least one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Height over width (A4 portrait is ~1.414).
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width as f64
    }
}

/// A closed contour found by the detector, with its enclosed area for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateContour {
    pub points: Vec<Point2D>,
    pub area: f64,
}

impl CandidateContour {
    pub fn new(points: Vec<Point2D>, area: f64) -> Self {
        Self { points, area }
    }

    /// Build a contour and compute its area with the shoelace formula.
    pub fn from_points(points: Vec<Point2D>) -> Self {
        let area = polygon_area(&points);
        Self { points, area }
    }

    /// Closed arc length (the last point connects back to the first).
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.points[i].distance(&self.points[(i + 1) % n]))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Unsigned polygon area via the shoelace formula.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice.abs() / 2.0
}

/// Lifecycle of a single scan invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    AwaitingInput,
    CandidateScan,
    /// A quadrilateral was found and the page was warped flat.
    Rectified,
    /// No usable quadrilateral; the input is handed back unchanged.
    Unrectified,
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingInput => "awaiting-input",
            Self::CandidateScan => "candidate-scan",
            Self::Rectified => "rectified",
            Self::Unrectified => "unrectified",
        };
        f.write_str(s)
    }
}

/// How the quad selector walks the ranked candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// First four-vertex match among the K largest candidates wins.
    #[default]
    GreedyFirstK,
    /// Every candidate is simplified; the largest-area four-vertex match wins.
    ExhaustiveMaxArea,
}

impl std::str::FromStr for SelectionPolicy {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "greedy-first-k" | "greedy" => Ok(Self::GreedyFirstK),
            "exhaustive-max-area" | "exhaustive" => Ok(Self::ExhaustiveMaxArea),
            other => Err(ScanError::Config(format!("unknown selection policy: {other}"))),
        }
    }
}

/// Resampling filter used when warping the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Standard paper sizes, used for PDF export and aspect checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Portrait height over width.
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.dimensions_mm();
        h as f64 / w.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrilateral_requires_four_points() {
        let three = [Point2D::new(0.0, 0.0); 3];
        assert!(matches!(
            Quadrilateral::from_slice(&three),
            Err(ScanError::InvalidInput(_))
        ));
        let four = [Point2D::new(1.0, 2.0); 4];
        assert!(Quadrilateral::from_slice(&four).is_ok());
    }

    #[test]
    fn destination_rect_clamps_to_one() {
        let rect = DestinationRect::new(0, 0);
        assert_eq!((rect.width, rect.height), (1, 1));
    }

    #[test]
    fn shoelace_area_and_perimeter() {
        let contour = CandidateContour::from_points(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 5.0),
            Point2D::new(0.0, 5.0),
        ]);
        assert!((contour.area - 50.0).abs() < 1e-9);
        assert!((contour.perimeter() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn policy_parses_both_spellings() {
        assert_eq!(
            "greedy-first-k".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::GreedyFirstK
        );
        assert_eq!(
            "Exhaustive".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::ExhaustiveMaxArea
        );
        assert!("best".parse::<SelectionPolicy>().is_err());
    }

    #[test]
    fn a4_aspect_is_root_two() {
        assert!((PaperSize::A4.aspect_ratio() - 1.414).abs() < 0.01);
    }
}
