// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flatscan — command-line document scanner.
//
// Entry point. Initialises logging and dispatches to a subcommand.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::annotate::AnnotateCommand;
use commands::batch::BatchCommand;
use commands::config::ConfigCommand;
use commands::scan::ScanCommand;

#[derive(Parser)]
#[command(
    name = "flatscan",
    version,
    about = "Turn a photographed document into a flat, scanned page",
    after_help = "EXAMPLES:\n  \
                  flatscan scan receipt.jpg -o receipt.png --overlay receipt.debug.png\n  \
                  flatscan scan contract.jpg --pdf contract.pdf --report contract.json\n  \
                  flatscan batch photos/*.jpg --out-dir scans --jobs 4\n  \
                  flatscan annotate page.png --polygon \"10,10;200,12;190,300;8,290\" -o marked.png\n  \
                  flatscan config --write flatscan.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect, rectify and binarize a single photograph
    Scan(ScanCommand),

    /// Scan many photographs concurrently
    Batch(BatchCommand),

    /// Draw a polygon and optional label on an image
    Annotate(AnnotateCommand),

    /// Print or write the effective configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    tracing::debug!("Flatscan starting");

    match cli.command {
        Commands::Scan(cmd) => cmd.execute(),
        Commands::Batch(cmd) => cmd.execute().await,
        Commands::Annotate(cmd) => cmd.execute(),
        Commands::Config(cmd) => cmd.execute(),
    }
}
