//! The replay loop — bars in, trades and events out.
//!
//! Per entry bar: feed the state machine, fold into the structure-bar
//! aggregator, and feed any completed structure bar with the level snapshot
//! aligned at or before its close. Entry signals remember the index of the
//! bar that confirmed them; once the replay finishes, every compiled order
//! is simulated against the strictly-following bar slice. Orders are
//! independent, so the simulation fans out across threads — the state
//! machine itself stays single-threaded and bar-ordered.

use crate::aggregate::TimeframeAggregator;
use rayon::prelude::*;
use sweeplab_core::compiler::OrderCompiler;
use sweeplab_core::config::{ConfigError, OrderParams, StrategyParams};
use sweeplab_core::domain::{Bar, LevelSnapshot, Timeframe, TradeRecord};
use sweeplab_core::fingerprint::RunFingerprint;
use sweeplab_core::series::SampledSeries;
use sweeplab_core::setups::{RecordingSink, SetupEngine, TransitionEvent};
use sweeplab_core::sim::{simulate_order, SimParams};
use thiserror::Error;

/// Errors from the replay layer.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("no bars to replay")]
    EmptyBars,

    #[error("bars are {found} but the strategy's entry timeframe is {expected}")]
    TimeframeMismatch { expected: Timeframe, found: Timeframe },
}

/// Complete output of one replay run.
#[derive(Debug)]
pub struct ReplayResult {
    pub trades: Vec<TradeRecord>,
    /// Full setup-transition stream, for diagnostics and replay.
    pub events: Vec<TransitionEvent>,
    /// Entry signals confirmed by the state machine.
    pub signal_count: usize,
    /// Signals the order compiler's risk filter rejected.
    pub rejected_by_risk: usize,
    pub entry_bar_count: usize,
    pub structure_bar_count: usize,
    pub fingerprint: RunFingerprint,
}

/// Run the full pipeline over a prepared entry-timeframe bar stream.
pub fn run_replay(
    bars: &[Bar],
    levels: Option<&SampledSeries<LevelSnapshot>>,
    strategy: &StrategyParams,
    order_params: &OrderParams,
    sim: &SimParams,
) -> Result<ReplayResult, ReplayError> {
    sim.validate()?;
    let mut engine = SetupEngine::new(strategy.clone())?;
    let compiler = OrderCompiler::new(order_params.clone())?;

    let first = bars.first().ok_or(ReplayError::EmptyBars)?;
    if first.timeframe != strategy.entry_tf {
        return Err(ReplayError::TimeframeMismatch {
            expected: strategy.entry_tf,
            found: first.timeframe,
        });
    }

    let mut aggregator = TimeframeAggregator::new(strategy.structure_tf);
    let mut sink = RecordingSink::default();
    let mut pending: Vec<(usize, sweeplab_core::setups::EntrySignal)> = Vec::new();
    let mut structure_bar_count = 0usize;

    for (i, bar) in bars.iter().enumerate() {
        // The entry bar is processed first; a structure bar it completes
        // closes at the same instant and follows it.
        for signal in engine.on_entry_bar(bar, &mut sink) {
            pending.push((i, signal));
        }
        for structure_bar in aggregator.push(bar) {
            let snapshot = levels.and_then(|s| s.latest_at(structure_bar.close_time()));
            engine.on_structure_bar(&structure_bar, snapshot, &mut sink);
            structure_bar_count += 1;
        }
    }

    let signal_count = pending.len();
    let compiled: Vec<(usize, sweeplab_core::domain::Order)> = pending
        .iter()
        .filter_map(|(i, signal)| compiler.compile(signal).map(|order| (*i, order)))
        .collect();
    let rejected_by_risk = signal_count - compiled.len();

    // Stateless across orders: the natural parallel boundary.
    let trades: Vec<TradeRecord> = compiled
        .par_iter()
        .map(|(i, order)| simulate_order(order, &bars[i + 1..], sim))
        .collect();

    Ok(ReplayResult {
        trades,
        events: sink.events,
        signal_count,
        rejected_by_risk,
        entry_bar_count: bars.len(),
        structure_bar_count,
        fingerprint: RunFingerprint::new(strategy, order_params, sim, bars),
    })
}
