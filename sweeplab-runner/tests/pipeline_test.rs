//! Full-pipeline integration tests: synthetic stream in, artifact out.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sweeplab_core::config::StrategyParams;
use sweeplab_core::domain::{Bar, LevelSnapshot, Timeframe};
use sweeplab_core::series::SampledSeries;
use sweeplab_core::sim::SimParams;
use sweeplab_runner::{build_artifact, run_replay, BacktestArtifact};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

/// Deterministic one-minute walk, volatile enough to cross the level grid
/// repeatedly.
fn make_entry_bars(n: usize) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    for i in 0..n {
        let seed = (i as u64).wrapping_mul(2862933555777941757).wrapping_add(3037000493);
        let change = ((seed >> 32) % 120) as f64 * 0.02 - 1.2;
        let wick = ((seed >> 11) % 60) as f64 * 0.03;
        price = (price + change).max(50.0);

        let open = price - change * 0.5;
        let close = price;
        bars.push(Bar {
            timestamp: base_time() + Duration::minutes(i as i64),
            open,
            high: open.max(close) + wick,
            low: open.min(close) - (1.8 - wick).max(0.2),
            close,
            volume: 100.0 + (seed % 400) as f64,
            timeframe: Timeframe::M1,
        });
    }
    bars
}

fn level_series() -> SampledSeries<LevelSnapshot> {
    // Two snapshots, so the nearest-prior lookup exercises both.
    let first = LevelSnapshot {
        timestamp: base_time(),
        support: vec![92.0, 96.0, 100.0],
        resistance: vec![104.0, 108.0],
        gamma_flip: Some(101.0),
        call_wall: Some(112.0),
        put_wall: Some(90.0),
        liquidity: vec![98.5],
    };
    let second = LevelSnapshot {
        timestamp: base_time() + Duration::hours(8),
        support: vec![90.0, 94.0, 98.0],
        resistance: vec![102.0, 106.0],
        gamma_flip: Some(99.0),
        call_wall: Some(110.0),
        put_wall: Some(88.0),
        liquidity: vec![96.5, 103.5],
    };
    SampledSeries::new(vec![(first.timestamp, first), (second.timestamp, second)]).unwrap()
}

fn lenient_params() -> StrategyParams {
    let mut params = StrategyParams::default();
    params.sweep.min_penetration = 0.5;
    params.structure.swing_lookback = 2;
    params.structure.confirm_buffer = 0.5;
    params.zone.min_size = 0.3;
    params.lifecycle.max_concurrent = 6;
    params
}

#[test]
fn two_runs_yield_byte_identical_artifacts() {
    let bars = make_entry_bars(3_000);
    let levels = level_series();
    let strategy = lenient_params();
    let order = sweeplab_core::config::OrderParams::default();
    let sim = SimParams::default();

    let encode = || {
        let result = run_replay(&bars, Some(&levels), &strategy, &order, &sim).unwrap();
        let artifact = build_artifact(result, &strategy, &order, &sim);
        serde_json::to_string(&artifact).unwrap()
    };
    assert_eq!(encode(), encode());
}

#[test]
fn artifact_roundtrips_and_counts_are_consistent() {
    let bars = make_entry_bars(3_000);
    let levels = level_series();
    let strategy = lenient_params();
    let order = sweeplab_core::config::OrderParams::default();
    let sim = SimParams::default();

    let result = run_replay(&bars, Some(&levels), &strategy, &order, &sim).unwrap();
    assert_eq!(result.entry_bar_count, 3_000);
    assert_eq!(result.structure_bar_count, 3_000 / 15);
    assert!(result.signal_count >= result.trades.len());
    assert_eq!(result.signal_count - result.rejected_by_risk, result.trades.len());

    let artifact = build_artifact(result, &strategy, &order, &sim);
    let json = serde_json::to_string(&artifact).unwrap();
    let reloaded: BacktestArtifact = serde_json::from_str(&json).unwrap();
    assert_eq!(reloaded.metrics.trade_count, artifact.trades.len());
    assert_eq!(reloaded.metrics.exits.total(), artifact.trades.len());
}

#[test]
fn event_stream_is_prefix_stable_under_truncation() {
    let bars = make_entry_bars(3_000);
    let levels = level_series();
    let strategy = lenient_params();
    let order = sweeplab_core::config::OrderParams::default();
    let sim = SimParams::default();

    let full = run_replay(&bars, Some(&levels), &strategy, &order, &sim).unwrap();
    let truncated =
        run_replay(&bars[..1_500], Some(&levels), &strategy, &order, &sim).unwrap();

    assert!(truncated.events.len() <= full.events.len());
    assert_eq!(truncated.events[..], full.events[..truncated.events.len()]);
}
