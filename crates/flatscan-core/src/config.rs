// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::{Interpolation, PaperSize, SelectionPolicy};

/// Tunables for one scan invocation. Every field has a default, so a partial
/// JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Height of the downscaled working copy used for contour search.
    pub working_height: u32,
    /// How many of the largest candidates the greedy selector examines.
    pub candidate_cap: usize,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_tolerance: f64,
    /// Gaussian blur sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    pub policy: SelectionPolicy,
    pub interpolation: Interpolation,
    pub threshold: ThresholdConfig,
    pub overlay: OverlayConfig,
    /// Page size for scan-to-PDF export.
    pub paper_size: PaperSize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            working_height: 500,
            candidate_cap: 5,
            approx_tolerance: 0.02,
            blur_sigma: 1.0,
            canny_low: 75.0,
            canny_high: 200.0,
            policy: SelectionPolicy::GreedyFirstK,
            interpolation: Interpolation::Bilinear,
            threshold: ThresholdConfig::default(),
            overlay: OverlayConfig::default(),
            paper_size: PaperSize::A4,
        }
    }
}

/// Local-threshold method for the "scanned" look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdMethod {
    /// Gaussian-weighted neighbourhood mean.
    #[default]
    Gaussian,
    /// Plain box mean over the neighbourhood.
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub method: ThresholdMethod,
    /// Odd neighbourhood side length in pixels.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub c: i32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::Gaussian,
            block_size: 11,
            c: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Line thickness of the quad drawn on the debug overlay.
    pub thickness: u32,
    /// RGB colour of the overlay outline.
    pub color: [u8; 3],
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            thickness: 2,
            color: [0, 255, 0],
        }
    }
}

impl ScanConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.working_height == 0 {
            return Err(ScanError::Config("working_height must be positive".into()));
        }
        if self.candidate_cap == 0 {
            return Err(ScanError::Config("candidate_cap must be at least 1".into()));
        }
        if !(self.approx_tolerance > 0.0 && self.approx_tolerance < 1.0) {
            return Err(ScanError::Config(format!(
                "approx_tolerance must be in (0, 1), got {}",
                self.approx_tolerance
            )));
        }
        if self.canny_low > self.canny_high {
            return Err(ScanError::Config(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        let block = self.threshold.block_size;
        if block < 3 || block % 2 == 0 {
            return Err(ScanError::Config(format!(
                "threshold block_size must be odd and >= 3, got {block}"
            )));
        }
        if self.overlay.thickness == 0 {
            return Err(ScanError::Config("overlay thickness must be positive".into()));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
