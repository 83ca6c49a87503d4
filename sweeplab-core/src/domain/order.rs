//! Order — the concrete instruction a ready setup compiles into.

use super::bar::Direction;
use super::ids::SetupId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_direction(direction: Direction) -> Side {
        match direction {
            Direction::Bullish => Side::Buy,
            Direction::Bearish => Side::Sell,
        }
    }

    /// +1.0 for buy, -1.0 for sell.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

/// Trailing-stop parameters: activation distance and trail offset, both in
/// price points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingSpec {
    /// Favorable excursion from entry required before the trail activates.
    pub trigger: f64,
    /// Distance the trailing level sits behind the high-water-mark.
    pub offset: f64,
}

/// Detection path that produced a setup. Alternate paths construct setups
/// past the sweep phase when their own preconditions are already satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryModel {
    /// Canonical path: liquidity sweep, then structure shift, then zone.
    SweepReversal,
    /// Direct construction at the structure-shift phase.
    StructureBreak,
    /// Direct construction at the entry-zone phase.
    ZoneRevisit,
}

/// A fully specified order awaiting historical execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub setup_id: SetupId,
    pub entry_model: EntryModel,
    pub side: Side,
    /// Nominal entry trigger price; the realized fill adds slippage.
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub trailing: Option<TrailingSpec>,
    /// Contracts/units; pnl scales linearly with it.
    pub quantity: f64,
    /// Exit at this bar's close once reached.
    pub max_hold_bars: u32,
    /// Reserved for a live adaptation (cancel an unfilled entry after N
    /// bars). Historical replay never reads it: the state machine only
    /// emits orders whose entry already confirmed.
    pub entry_timeout_bars: Option<u32>,
    pub signal_time: DateTime<Utc>,
}

impl Order {
    /// Entry-to-stop distance in points; positive when the stop is on the
    /// adverse side of the entry.
    pub fn risk_points(&self) -> f64 {
        (self.entry - self.stop) * self.side.sign()
    }

    /// Entry-to-target distance in points.
    pub fn reward_points(&self) -> f64 {
        (self.target - self.entry) * self.side.sign()
    }
}
