//! Swing extraction over a bounded structure-bar window.
//!
//! A bar at position `i` is a confirmed swing high iff no bar in
//! `[i-L, i+L] \ {i}` has an equal or higher high (mirror for lows).
//! Confirmation therefore lags the extremum by `L` bars; positions without
//! `L` bars on both sides stay provisional and are never emitted.

use crate::domain::{Bar, SwingKind, SwingPoint};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct WindowBar {
    seq: u64,
    timestamp: DateTime<Utc>,
    high: f64,
    low: f64,
}

/// Incremental swing detector. Feed structure bars in order; query
/// confirmed swings by sequence range.
#[derive(Debug, Clone)]
pub struct SwingTracker {
    lookback: usize,
    /// Sliding window of the last `2*lookback + 1` bars.
    window: VecDeque<WindowBar>,
    confirmed: Vec<SwingPoint>,
    /// Confirmed swings older than this many bars are pruned.
    retention_bars: u64,
}

impl SwingTracker {
    pub fn new(lookback: usize, retention_bars: u64) -> Self {
        Self {
            lookback,
            window: VecDeque::with_capacity(2 * lookback + 2),
            confirmed: Vec::new(),
            retention_bars,
        }
    }

    /// Push the next structure bar; returns any swings confirmed by it.
    pub fn push(&mut self, seq: u64, bar: &Bar) -> Vec<SwingPoint> {
        self.window.push_back(WindowBar {
            seq,
            timestamp: bar.timestamp,
            high: bar.high,
            low: bar.low,
        });
        let span = 2 * self.lookback + 1;
        while self.window.len() > span {
            self.window.pop_front();
        }

        let mut out = Vec::new();
        if self.window.len() == span {
            let candidate = self.window[self.lookback];
            let dominated_high = self
                .window
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != self.lookback)
                .all(|(_, b)| b.high < candidate.high);
            if dominated_high {
                out.push(SwingPoint {
                    kind: SwingKind::High,
                    price: candidate.high,
                    timestamp: candidate.timestamp,
                    bar_seq: candidate.seq,
                });
            }
            let dominated_low = self
                .window
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != self.lookback)
                .all(|(_, b)| b.low > candidate.low);
            if dominated_low {
                out.push(SwingPoint {
                    kind: SwingKind::Low,
                    price: candidate.low,
                    timestamp: candidate.timestamp,
                    bar_seq: candidate.seq,
                });
            }
        }

        self.confirmed.extend(out.iter().copied());
        let cutoff = seq.saturating_sub(self.retention_bars);
        self.confirmed.retain(|s| s.bar_seq >= cutoff);
        out
    }

    /// Confirmed swings of `kind` positioned in `[from_seq, to_seq]`,
    /// in position order. The empty case is the expected common outcome,
    /// not an error.
    pub fn swings_between(
        &self,
        kind: SwingKind,
        from_seq: u64,
        to_seq: u64,
    ) -> impl Iterator<Item = &SwingPoint> {
        self.confirmed
            .iter()
            .filter(move |s| s.kind == kind && s.bar_seq >= from_seq && s.bar_seq <= to_seq)
    }

    /// Most recent confirmed swing of `kind` at or before `to_seq`.
    pub fn latest(&self, kind: SwingKind, to_seq: u64) -> Option<&SwingPoint> {
        self.confirmed
            .iter()
            .filter(|s| s.kind == kind && s.bar_seq <= to_seq)
            .max_by_key(|s| s.bar_seq)
    }
}
