// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `flatscan batch` — scan many photographs concurrently.
//
// Each image is an independent blocking job on tokio's blocking pool; a
// semaphore bounds how many decode/warp buffers are alive at once. The
// pipeline itself is shared read-only.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use flatscan_core::{PaperSize, ScanState};
use flatscan_document::ScanPipeline;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use super::scan::{ScanOutputs, scan_file};
use super::{ConfigArgs, sibling_path};

#[derive(Args, Debug)]
pub struct BatchCommand {
    /// Photographs to scan
    #[arg(value_name = "IMAGES", required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving <stem>.scan.png and <stem>.report.json per input
    #[arg(long, value_name = "DIR")]
    out_dir: PathBuf,

    /// Maximum concurrent scans (default: available cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Also write <stem>.pdf per input
    #[arg(long)]
    pdf: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

/// Tally of a finished batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub rectified: usize,
    pub unrectified: usize,
    pub failed: usize,
}

impl BatchCommand {
    pub async fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        let paper = config.paper_size;
        let pipeline = Arc::new(ScanPipeline::new(config)?);
        let jobs = self.jobs.unwrap_or_else(default_jobs).max(1);

        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating {}", self.out_dir.display()))?;

        info!(inputs = self.inputs.len(), jobs, "Starting batch");
        let summary = run_batch(
            pipeline,
            self.inputs,
            self.out_dir,
            jobs,
            paper,
            self.pdf,
        )
        .await?;
        info!(
            rectified = summary.rectified,
            unrectified = summary.unrectified,
            failed = summary.failed,
            "Batch finished"
        );

        if summary.failed > 0 {
            bail!("{} of the inputs could not be scanned", summary.failed);
        }
        Ok(())
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

pub async fn run_batch(
    pipeline: Arc<ScanPipeline>,
    inputs: Vec<PathBuf>,
    out_dir: PathBuf,
    jobs: usize,
    paper: PaperSize,
    pdf: bool,
) -> Result<BatchSummary> {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut handles = Vec::with_capacity(inputs.len());

    for input in inputs {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("batch semaphore closed")?;
        let pipeline = Arc::clone(&pipeline);
        let outputs = ScanOutputs {
            scanned: sibling_path(&input, Some(&out_dir), "scan.png"),
            overlay: None,
            pdf: pdf.then(|| sibling_path(&input, Some(&out_dir), "pdf")),
            report: Some(sibling_path(&input, Some(&out_dir), "report.json")),
        };

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = scan_file(&pipeline, &input, &outputs, paper, false);
            (input, result)
        }));
    }

    let mut summary = BatchSummary::default();
    for handle in handles {
        match handle.await {
            Ok((_, Ok(report))) if report.state == ScanState::Rectified => summary.rectified += 1,
            Ok((input, Ok(_))) => {
                warn!(input = %input.display(), "Kept unrectified");
                summary.unrectified += 1;
            }
            Ok((input, Err(err))) => {
                error!(input = %input.display(), error = %format!("{err:#}"), "Scan failed");
                summary.failed += 1;
            }
            Err(join_err) => {
                error!(error = %join_err, "Scan worker panicked");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}
