// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — contour detection, quad selection, homography
// rectification, binarization and run reports.

pub mod detect;
pub mod enhance;
pub mod homography;
pub mod pipeline;
pub mod report;
pub mod select;

pub use detect::{ContourDetector, DouglasPeucker, EdgeContourDetector, PolygonApproximator};
pub use enhance::{AdaptiveThreshold, Binarizer};
pub use homography::{Homography, HomographyRectifier};
pub use pipeline::{ScanOutcome, ScanPipeline};
pub use report::ScanReport;
pub use select::{QuadSelector, Selection};
