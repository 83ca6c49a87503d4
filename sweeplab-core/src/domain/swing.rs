//! Swing points — confirmed local extrema on the structure timeframe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed swing point.
///
/// Valid only once `lookback` bars on each side are strictly dominated by
/// the extremum; positions near the edge of the buffered window stay
/// provisional until enough bars exist on both sides, so a swing's
/// confirmation always lags its position by the lookback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub kind: SwingKind,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    /// Structure-bar sequence number of the extremum bar itself (not of the
    /// bar that confirmed it).
    pub bar_seq: u64,
}
