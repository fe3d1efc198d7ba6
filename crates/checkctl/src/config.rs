//! Configuration management for the CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use check_engine::{CheckConfigs, SloSettings};
use serde::Deserialize;

/// CLI configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckctlConfig {
    /// Override document used when `--overrides` is not given
    #[serde(default)]
    pub overrides: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Default latency objective buckets
    #[serde(default)]
    pub slo: SloSettings,
}

impl CheckctlConfig {
    /// Load configuration from an optional file and `CHECKCTL_*` variables.
    ///
    /// Nested keys use a double underscore, e.g. `CHECKCTL_SLO__OBJECTIVE_BUCKET`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        let config = builder
            .add_source(
                ::config::Environment::with_prefix("CHECKCTL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }
}

/// Read an override document; no path means no overrides
pub fn load_overrides(path: Option<&Path>) -> Result<CheckConfigs> {
    let Some(path) = path else {
        return Ok(CheckConfigs::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read override file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse override file {}", path.display()))
}
