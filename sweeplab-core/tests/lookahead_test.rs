//! No-look-ahead contamination tests.
//!
//! Invariant: a transition recorded at bar N depends only on bars <= N.
//! Method: replay the engine on a truncated stream and on the full stream;
//! the truncated run's event sequence must be an exact prefix of the full
//! run's. Any difference means future bars leaked into past transitions.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sweeplab_core::config::StrategyParams;
use sweeplab_core::domain::{Bar, LevelSnapshot, Timeframe};
use sweeplab_core::setups::{RecordingSink, SetupEngine, TransitionEvent};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

/// Deterministic pseudo-random walk using a simple LCG, volatile enough to
/// produce sweeps, shifts, and zones against a fixed level grid.
fn make_structure_bars(n: usize) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let change = ((seed >> 33) % 200) as f64 * 0.08 - 8.0;
        let spike = ((seed >> 13) % 100) as f64 * 0.06;
        price = (price + change).max(40.0);

        let open = price - change * 0.4;
        let close = price;
        let high = open.max(close) + spike;
        let low = open.min(close) - (6.0 - spike).max(0.5);
        bars.push(Bar {
            timestamp: base_time() + Duration::minutes(15 * i as i64),
            open,
            high,
            low,
            close,
            volume: 500.0 + (seed % 1000) as f64,
            timeframe: Timeframe::M15,
        });
    }
    bars
}

fn level_grid() -> LevelSnapshot {
    LevelSnapshot {
        timestamp: base_time(),
        support: vec![80.0, 90.0, 100.0, 110.0],
        resistance: vec![95.0, 105.0, 115.0, 125.0],
        gamma_flip: Some(102.0),
        call_wall: Some(120.0),
        put_wall: Some(85.0),
        liquidity: vec![98.5, 107.5],
    }
}

fn lenient_params() -> StrategyParams {
    let mut params = StrategyParams::default();
    params.sweep.min_penetration = 1.0;
    params.structure.swing_lookback = 2;
    params.structure.confirm_buffer = 1.0;
    params.zone.min_size = 0.5;
    params.lifecycle.max_concurrent = 6;
    params
}

fn replay(bars: &[Bar]) -> Vec<TransitionEvent> {
    let mut engine = SetupEngine::new(lenient_params()).unwrap();
    let mut sink = RecordingSink::default();
    let levels = level_grid();
    for bar in bars {
        engine.on_structure_bar(bar, Some(&levels), &mut sink);
    }
    sink.events
}

#[test]
fn truncated_replay_is_exact_prefix_of_full_replay() {
    let bars = make_structure_bars(200);
    let full = replay(&bars);
    assert!(
        !full.is_empty(),
        "synthetic walk should produce at least one transition"
    );

    for cut in [50, 100, 150, 199] {
        let truncated = replay(&bars[..cut]);
        assert!(
            truncated.len() <= full.len(),
            "truncated run produced more events than the full run"
        );
        assert_eq!(
            truncated[..],
            full[..truncated.len()],
            "event streams diverge before the cut at bar {cut}"
        );
    }
}

#[test]
fn full_replay_is_deterministic() {
    let bars = make_structure_bars(200);
    assert_eq!(replay(&bars), replay(&bars));
}
