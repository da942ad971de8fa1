// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations and the options they share.

pub mod annotate;
pub mod batch;
pub mod config;
pub mod scan;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use flatscan_core::human_errors::humanize_error;
use flatscan_core::{Interpolation, ScanConfig, ScanError, SelectionPolicy};
use image::DynamicImage;
use tracing::error;

use flatscan_document::ImageProcessor;

/// Configuration file plus per-run overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of largest contours examined for a four-sided outline
    #[arg(long)]
    pub cap: Option<usize>,

    /// Selection policy: greedy-first-k or exhaustive-max-area
    #[arg(long)]
    pub policy: Option<SelectionPolicy>,

    /// Height of the downscaled copy used for outline search
    #[arg(long)]
    pub working_height: Option<u32>,

    /// Use nearest-neighbour instead of bilinear resampling
    #[arg(long)]
    pub nearest: bool,
}

impl ConfigArgs {
    /// File (or defaults) with command-line overrides applied, validated.
    pub fn resolve(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => ScanConfig::default(),
        };

        if let Some(cap) = self.cap {
            config.candidate_cap = cap;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(height) = self.working_height {
            config.working_height = height;
        }
        if self.nearest {
            config.interpolation = Interpolation::Nearest;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Decode an image from disk, dropping any alpha channel.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let image = ImageProcessor::open(path)
        .map_err(report)
        .with_context(|| format!("reading {}", path.display()))?
        .flatten_alpha()
        .into_dynamic();
    Ok(image)
}

/// Log the human-readable form of a library error before it propagates.
pub fn report(err: ScanError) -> ScanError {
    let human = humanize_error(&err);
    error!(suggestion = %human.suggestion, "{}", human.message);
    err
}

/// `<dir>/<stem>.<suffix>`, where `dir` defaults to the input's directory.
pub fn sibling_path(input: &Path, dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_owned());
    let dir = dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{stem}.{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let args = ConfigArgs {
            cap: Some(8),
            policy: Some(SelectionPolicy::ExhaustiveMaxArea),
            nearest: true,
            ..ConfigArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.candidate_cap, 8);
        assert_eq!(config.policy, SelectionPolicy::ExhaustiveMaxArea);
        assert_eq!(config.interpolation, Interpolation::Nearest);
        assert_eq!(config.working_height, 500);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = ConfigArgs {
            working_height: Some(0),
            ..ConfigArgs::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn config_file_is_layered_under_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flatscan.json");
        std::fs::write(&path, r#"{ "candidate_cap": 3, "working_height": 400 }"#).unwrap();

        let args = ConfigArgs {
            config: Some(path),
            working_height: Some(600),
            ..ConfigArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.candidate_cap, 3);
        assert_eq!(config.working_height, 600);
    }

    #[test]
    fn sibling_paths() {
        let input = Path::new("/photos/receipt.jpg");
        assert_eq!(
            sibling_path(input, None, "scan.png"),
            PathBuf::from("/photos/receipt.scan.png")
        );
        assert_eq!(
            sibling_path(input, Some(Path::new("/out")), "report.json"),
            PathBuf::from("/out/receipt.report.json")
        );
    }
}
