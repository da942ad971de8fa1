// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan reports — a JSON-serialisable record of what one scan did, with
// SHA-256 fingerprints of the input and output pixels.

use std::path::Path;

use chrono::{DateTime, Utc};
use flatscan_core::error::Result;
use flatscan_core::types::{DestinationRect, PaperSize, Point2D, ScanState};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::pipeline::ScanOutcome;

/// Relative aspect difference within which a page counts as a paper size.
const PAPER_MATCH_TOLERANCE: f64 = 0.03;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Source file, when the scan came from disk.
    pub source: Option<String>,
    pub state: ScanState,
    pub input_width: u32,
    pub input_height: u32,
    /// Page corners in source coordinates: top-left, top-right,
    /// bottom-right, bottom-left.
    pub corners: Option<[Point2D; 4]>,
    pub output: Option<DestinationRect>,
    /// Output height over width.
    pub aspect_ratio: Option<f64>,
    /// Standard sheet whose proportions the output matches, if any.
    pub paper_match: Option<PaperSize>,
    pub input_sha256: String,
    pub output_sha256: String,
    pub processed_at: DateTime<Utc>,
}

impl ScanReport {
    pub fn from_outcome(input: &DynamicImage, outcome: &ScanOutcome) -> Self {
        let aspect_ratio = outcome.rect.map(|r| r.aspect_ratio());
        Self {
            source: None,
            state: outcome.state,
            input_width: input.width(),
            input_height: input.height(),
            corners: outcome.quad.map(|q| q.corners()),
            output: outcome.rect,
            aspect_ratio,
            paper_match: aspect_ratio.and_then(match_paper),
            input_sha256: hash_bytes(input.as_bytes()),
            output_sha256: hash_bytes(outcome.scanned.as_bytes()),
            processed_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Closest standard sheet to a height/width `aspect`, portrait or landscape.
/// A-series sizes share one ratio, so A4 stands for all of them.
pub fn match_paper(aspect: f64) -> Option<PaperSize> {
    if !aspect.is_finite() || aspect <= 0.0 {
        return None;
    }
    let portrait = if aspect < 1.0 { 1.0 / aspect } else { aspect };

    [PaperSize::A4, PaperSize::Letter, PaperSize::Legal]
        .into_iter()
        .map(|paper| {
            let target = paper.aspect_ratio();
            (paper, (portrait - target).abs() / target)
        })
        .filter(|(_, err)| *err <= PAPER_MATCH_TOLERANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(paper, _)| paper)
}
