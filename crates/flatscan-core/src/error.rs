// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flatscan.

use thiserror::Error;

/// Top-level error type for all Flatscan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Quadrilateral recovery --
    /// The candidate cap was exhausted without a four-vertex match. The scan
    /// pipeline recovers from this locally and never surfaces it as fatal.
    #[error("no four-sided candidate found among the ranked contours")]
    NoQuadFound,

    /// Three or more of the four corners are collinear, so the homography
    /// system is singular.
    #[error("degenerate quadrilateral: {0}")]
    DegenerateQuad(String),

    /// Programming-contract violation: empty image, wrong point count, etc.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // -- Imaging / output --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF export failed: {0}")]
    PdfError(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Whether the pipeline can still hand back a displayable image after
    /// this error (the original frame, unrectified).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoQuadFound | Self::DegenerateQuad(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
