//! JSON artifact export.
//!
//! One file per run, named by the run fingerprint so re-runs of identical
//! inputs land on the same path. The schema_version field makes older
//! artifacts forward-readable.

use crate::metrics::PerformanceMetrics;
use crate::replay::ReplayResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use sweeplab_core::config::{OrderParams, StrategyParams};
use sweeplab_core::domain::TradeRecord;
use sweeplab_core::fingerprint::RunFingerprint;
use sweeplab_core::setups::TransitionEvent;
use sweeplab_core::sim::SimParams;
use thiserror::Error;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything downstream tooling needs to reproduce or analyze a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct BacktestArtifact {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub fingerprint: RunFingerprint,
    pub strategy: StrategyParams,
    pub order: OrderParams,
    pub sim: SimParams,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<TradeRecord>,
    /// The full setup-transition stream for diagnostics/replay.
    pub events: Vec<TransitionEvent>,
    pub signal_count: usize,
    pub rejected_by_risk: usize,
    pub entry_bar_count: usize,
    pub structure_bar_count: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Assemble the artifact from a replay result and its configuration.
pub fn build_artifact(
    result: ReplayResult,
    strategy: &StrategyParams,
    order: &OrderParams,
    sim: &SimParams,
) -> BacktestArtifact {
    let metrics = PerformanceMetrics::compute(&result.trades);
    BacktestArtifact {
        schema_version: SCHEMA_VERSION,
        fingerprint: result.fingerprint,
        strategy: strategy.clone(),
        order: order.clone(),
        sim: *sim,
        metrics,
        trades: result.trades,
        events: result.events,
        signal_count: result.signal_count,
        rejected_by_risk: result.rejected_by_risk,
        entry_bar_count: result.entry_bar_count,
        structure_bar_count: result.structure_bar_count,
    }
}

/// Write the artifact under `dir`, returning the file path.
pub fn save_artifact(dir: &Path, artifact: &BacktestArtifact) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let run_id = artifact.fingerprint.run_id();
    let short = &run_id.0[..16.min(run_id.0.len())];
    let path = dir.join(format!("run-{short}.json"));
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(&path, json)?;
    Ok(path)
}
