// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `flatscan config` — show or write the effective configuration.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Write the configuration to FILE instead of printing it
    #[arg(long, value_name = "FILE")]
    write: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        match &self.write {
            Some(path) => {
                config
                    .save(path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "Configuration written");
            }
            None => println!("{}", serde_json::to_string_pretty(&config)?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatscan_core::ScanConfig;

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flatscan.json");
        let cmd = ConfigCommand {
            write: Some(path.clone()),
            config: ConfigArgs {
                cap: Some(7),
                ..ConfigArgs::default()
            },
        };
        cmd.execute().unwrap();

        let loaded = ScanConfig::load(&path).unwrap();
        assert_eq!(loaded.candidate_cap, 7);
    }
}
