//! Bar — the fundamental market data unit.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar granularity. Coarser timeframes derive from the base entry-timeframe
/// series and stay mutually consistent with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Bar duration in minutes.
    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// Bar duration as a chrono interval.
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        };
        write!(f, "{s}")
    }
}

/// Directional bias of a setup, zone, or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
        }
    }

    /// +1.0 for bullish, -1.0 for bearish. Multiplying a signed price move
    /// by this yields the favorable excursion.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Bullish => 1.0,
            Direction::Bearish => -1.0,
        }
    }
}

/// OHLCV bar, immutable once produced.
///
/// `timestamp` is the bar's open time. The ingestion layer guarantees
/// chronological order and sane prices; `is_sane` exists so the core can
/// fail fast on contract violations rather than recover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timeframe: Timeframe,
}

impl Bar {
    /// Close time: open time plus the bar's timeframe duration.
    pub fn close_time(&self) -> DateTime<Utc> {
        self.timestamp + self.timeframe.duration()
    }

    /// Basic OHLCV sanity check: finite prices, high >= low, extremes
    /// bracket open and close.
    pub fn is_sane(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// True if the bar's range brackets `price` (touch inclusive).
    pub fn brackets(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}
