//! Serializable run configuration.
//!
//! A TOML file fully describes a replay: where the prepared data lives,
//! the strategy/order/simulator parameters. Validation of parameter values
//! happens in the core's `validate()` methods; this module only adds file
//! handling on top.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use sweeplab_core::config::{ConfigError, OrderParams, StrategyParams};
use sweeplab_core::sim::SimParams;
use thiserror::Error;

/// Errors from reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("io error reading '{path}': {source}")]
    Io { path: String, source: std::io::Error },

    #[error("toml error in '{path}': {source}")]
    Toml { path: String, source: toml::de::Error },

    #[error("invalid parameters: {0}")]
    Invalid(#[from] ConfigError),
}

/// Input file locations for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV bar file at entry-timeframe granularity.
    pub bars: PathBuf,
    /// Optional JSON array of level snapshots.
    #[serde(default)]
    pub levels: Option<PathBuf>,
}

/// Complete configuration for a single replay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyParams,
    #[serde(default)]
    pub order: OrderParams,
    #[serde(default)]
    pub sim: SimParams,
}

impl BacktestConfig {
    /// Read and validate a TOML config file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigFileError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: BacktestConfig =
            toml::from_str(&raw).map_err(|source| ConfigFileError::Toml {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject malformed parameter values before any data is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        self.order.validate()?;
        self.sim.validate()?;
        Ok(())
    }
}
