// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `flatscan scan` — one photograph in, one scanned page out.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use flatscan_core::PaperSize;
use flatscan_document::{ImageProcessor, PdfWriter, ScanPipeline, ScanReport};
use tracing::{info, warn};

use super::{ConfigArgs, load_image, report, sibling_path};

#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Photograph of the document
    #[arg(value_name = "IMAGE")]
    input: PathBuf,

    /// Scanned page output (default: <IMAGE stem>.scan.png next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write the working copy with the detected outline drawn on it
    #[arg(long, value_name = "FILE")]
    overlay: Option<PathBuf>,

    /// Also export the scanned page as a one-page PDF
    #[arg(long, value_name = "FILE")]
    pdf: Option<PathBuf>,

    /// Write a JSON run report
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Fail on a degenerate page outline instead of keeping the photo as-is
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

/// Where one scan writes its results.
#[derive(Debug, Clone, Default)]
pub struct ScanOutputs {
    pub scanned: PathBuf,
    pub overlay: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

impl ScanCommand {
    pub fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        let paper = config.paper_size;
        let pipeline = ScanPipeline::new(config)?;

        let outputs = ScanOutputs {
            scanned: self
                .output
                .clone()
                .unwrap_or_else(|| sibling_path(&self.input, None, "scan.png")),
            overlay: self.overlay,
            pdf: self.pdf,
            report: self.report,
        };

        let summary = scan_file(&pipeline, &self.input, &outputs, paper, self.strict)?;
        info!(
            state = %summary.state,
            output = %outputs.scanned.display(),
            "Scan finished"
        );
        Ok(())
    }
}

/// Scan one file and write every requested output. Shared by `scan` and
/// `batch`.
pub fn scan_file(
    pipeline: &ScanPipeline,
    input: &Path,
    outputs: &ScanOutputs,
    paper: PaperSize,
    strict: bool,
) -> Result<ScanReport> {
    let image = load_image(input)?;

    let outcome = if strict {
        pipeline.scan(&image)
    } else {
        pipeline.scan_or_original(&image)
    }
    .map_err(report)
    .with_context(|| format!("scanning {}", input.display()))?;

    if !outcome.is_rectified() {
        warn!(input = %input.display(), "No page outline found; keeping the photo unrectified");
    }

    ImageProcessor::from_dynamic(outcome.scanned.clone())
        .save(&outputs.scanned)
        .with_context(|| format!("writing {}", outputs.scanned.display()))?;

    if let Some(path) = &outputs.overlay {
        ImageProcessor::from_dynamic(outcome.overlay.clone())
            .save(path)
            .with_context(|| format!("writing overlay {}", path.display()))?;
    }

    if let Some(path) = &outputs.pdf {
        let mut writer = PdfWriter::new(paper);
        writer.set_title(
            input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Scan".to_owned()),
        );
        writer
            .write_image_to_file(&outcome.scanned, path)
            .with_context(|| format!("writing PDF {}", path.display()))?;
    }

    let run_report =
        ScanReport::from_outcome(&image, &outcome).with_source(input.display().to_string());
    if let Some(path) = &outputs.report {
        run_report
            .save(path)
            .with_context(|| format!("writing report {}", path.display()))?;
    }

    Ok(run_report)
}
