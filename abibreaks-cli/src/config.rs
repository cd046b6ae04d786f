//! Configuration file loading for abibreaks.
//!
//! Discovers and loads `abibreaks.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use abibreaks_core::settings::{DEFAULT_COMPARER, default_jobs};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use std::num::NonZeroUsize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "abibreaks.toml";

/// Top-level configuration from abibreaks.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AbiBreaksConfig {
    /// Run settings.
    pub run: RunConfig,

    /// Comparer settings.
    pub comparer: ComparerConfig,
}

/// Run section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Maximum number of concurrent revision extractions.
    pub jobs: Option<usize>,
}

/// Comparer section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparerConfig {
    /// stgdiff executable (name on PATH or path).
    pub program: Option<String>,
}

/// Discover the abibreaks.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<AbiBreaksConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<AbiBreaksConfig> {
    let config: AbiBreaksConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return default if not found.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<AbiBreaksConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(AbiBreaksConfig::default()),
    }
}

/// Effective settings after merging config file and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub jobs: NonZeroUsize,
    pub program: String,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: AbiBreaksConfig,
}

impl ConfigMerger {
    pub fn new(config: AbiBreaksConfig) -> Self {
        Self { config }
    }

    /// Merge with update command arguments.
    ///
    /// `cli_program` already includes the `STGDIFF` environment variable,
    /// which clap binds to the same argument.
    pub fn merge_update_args(
        self,
        cli_jobs: Option<NonZeroUsize>,
        cli_program: Option<String>,
    ) -> anyhow::Result<MergedConfig> {
        let config_jobs = match self.config.run.jobs {
            Some(jobs) => Some(
                NonZeroUsize::new(jobs)
                    .ok_or_else(|| anyhow::anyhow!("run.jobs must be at least 1"))?,
            ),
            None => None,
        };

        Ok(MergedConfig {
            jobs: cli_jobs.or(config_jobs).unwrap_or_else(default_jobs),
            program: cli_program
                .or(self.config.comparer.program)
                .unwrap_or_else(|| DEFAULT_COMPARER.to_string()),
        })
    }
}
