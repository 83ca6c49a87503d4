//! Parameter sweeps — a cartesian grid of full deterministic runs.
//!
//! Each grid cell clones the base configuration, applies its overrides,
//! and replays the entire stream. Cells are independent, so the grid fans
//! out across threads; results come back in grid order regardless of
//! scheduling, then get ranked by net pnl.

use crate::replay::{run_replay, ReplayError};
use crate::metrics::PerformanceMetrics;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sweeplab_core::config::{OrderParams, StrategyParams, TargetPolicy};
use sweeplab_core::domain::{Bar, LevelSnapshot};
use sweeplab_core::series::SampledSeries;
use sweeplab_core::sim::SimParams;

/// Axes of the sweep grid. Empty axes fall back to the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    pub min_penetration: Vec<f64>,
    pub confirm_buffer: Vec<f64>,
    pub target_multiple: Vec<f64>,
    pub confirmation: Vec<bool>,
}

/// Sweep configuration: base parameters plus the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub strategy: StrategyParams,
    #[serde(default)]
    pub order: OrderParams,
    #[serde(default)]
    pub sim: SimParams,
    #[serde(default)]
    pub grid: SweepGrid,
}

/// One evaluated grid cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// Human-readable cell label, e.g. `pen=2 buf=1.5 tgt=2x confirm=on`.
    pub label: String,
    pub strategy: StrategyParams,
    pub order: OrderParams,
    pub metrics: PerformanceMetrics,
}

fn axis<T: Clone>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

/// Expand the grid into concrete parameter sets.
fn expand(config: &SweepConfig) -> Vec<(String, StrategyParams, OrderParams)> {
    let penetrations = axis(&config.grid.min_penetration, config.strategy.sweep.min_penetration);
    let buffers = axis(&config.grid.confirm_buffer, config.strategy.structure.confirm_buffer);
    let base_multiple = match config.order.target {
        TargetPolicy::RiskMultiple { multiple } => multiple,
        TargetPolicy::FixedPoints { .. } => 2.0,
    };
    let multiples = axis(&config.grid.target_multiple, base_multiple);
    let confirmations = axis(&config.grid.confirmation, config.strategy.entry.confirmation);

    let mut cells = Vec::new();
    for &penetration in &penetrations {
        for &buffer in &buffers {
            for &multiple in &multiples {
                for &confirmation in &confirmations {
                    let mut strategy = config.strategy.clone();
                    strategy.sweep.min_penetration = penetration;
                    strategy.structure.confirm_buffer = buffer;
                    strategy.entry.confirmation = confirmation;
                    let mut order = config.order.clone();
                    order.target = TargetPolicy::RiskMultiple { multiple };
                    let label = format!(
                        "pen={penetration} buf={buffer} tgt={multiple}x confirm={}",
                        if confirmation { "on" } else { "off" }
                    );
                    cells.push((label, strategy, order));
                }
            }
        }
    }
    cells
}

/// Run every grid cell and rank the outcomes by total net pnl.
pub fn run_sweep(
    bars: &[Bar],
    levels: Option<&SampledSeries<LevelSnapshot>>,
    config: &SweepConfig,
) -> Result<Vec<SweepOutcome>, ReplayError> {
    let cells = expand(config);

    let mut outcomes = cells
        .into_par_iter()
        .map(|(label, strategy, order)| {
            let result = run_replay(bars, levels, &strategy, &order, &config.sim)?;
            let metrics = PerformanceMetrics::compute(&result.trades);
            Ok(SweepOutcome { label, strategy, order, metrics })
        })
        .collect::<Result<Vec<_>, ReplayError>>()?;

    outcomes.sort_by(|a, b| {
        b.metrics
            .total_net_pnl
            .total_cmp(&a.metrics.total_net_pnl)
            .then_with(|| a.label.cmp(&b.label))
    });
    Ok(outcomes)
}
