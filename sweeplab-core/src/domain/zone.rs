//! Zones — three-bar price imbalances read as unfilled order concentrations.

use super::bar::Direction;
use super::ids::ZoneId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the canonical re-entry trigger is derived from the zone interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneTrigger {
    /// Midpoint of the interval.
    Midpoint,
    /// The boundary nearest to approaching price: top for a bullish zone
    /// revisited from above, bottom for a bearish zone revisited from below.
    NearEdge,
}

/// A price imbalance `[bottom, top]` with direction and lifecycle flags.
///
/// Zones live in the engine's zone book with their own maximum lifetime,
/// independent of any setup that references them — a zone may outlive a
/// reverted setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub direction: Direction,
    pub bottom: f64,
    pub top: f64,
    pub created_at: DateTime<Utc>,
    /// Structure-bar sequence at creation; zone age is measured against it.
    pub created_seq: u64,
    /// Set once later price trades through the trigger level.
    pub filled: bool,
    /// Set once a close beyond the far boundary (plus buffer) indicates the
    /// zone's resting orders were consumed by opposing flow.
    pub mitigated: bool,
}

impl Zone {
    pub fn size(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn midpoint(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Re-entry trigger price under the configured mode.
    pub fn trigger(&self, mode: ZoneTrigger) -> f64 {
        match mode {
            ZoneTrigger::Midpoint => self.midpoint(),
            ZoneTrigger::NearEdge => match self.direction {
                Direction::Bullish => self.top,
                Direction::Bearish => self.bottom,
            },
        }
    }

    /// The boundary a favorable retest must not close beyond: bottom for a
    /// bullish zone, top for a bearish one.
    pub fn far_boundary(&self) -> f64 {
        match self.direction {
            Direction::Bullish => self.bottom,
            Direction::Bearish => self.top,
        }
    }

    /// True when `close` has traded through the far boundary by more than
    /// `buffer` — the mitigation/invalidation condition.
    pub fn close_breaches(&self, close: f64, buffer: f64) -> bool {
        match self.direction {
            Direction::Bullish => close < self.bottom - buffer,
            Direction::Bearish => close > self.top + buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn zone(direction: Direction) -> Zone {
        Zone {
            id: ZoneId(0),
            direction,
            bottom: 111.0,
            top: 114.0,
            created_at: Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
            created_seq: 10,
            filled: false,
            mitigated: false,
        }
    }

    #[test]
    fn midpoint_and_size() {
        let z = zone(Direction::Bullish);
        assert_eq!(z.midpoint(), 112.5);
        assert_eq!(z.size(), 3.0);
    }

    #[test]
    fn trigger_modes() {
        let z = zone(Direction::Bullish);
        assert_eq!(z.trigger(ZoneTrigger::Midpoint), 112.5);
        assert_eq!(z.trigger(ZoneTrigger::NearEdge), 114.0);
        let z = zone(Direction::Bearish);
        assert_eq!(z.trigger(ZoneTrigger::NearEdge), 111.0);
    }

    #[test]
    fn breach_requires_buffer() {
        let z = zone(Direction::Bullish);
        assert!(!z.close_breaches(110.5, 1.0)); // within buffer
        assert!(z.close_breaches(109.9, 1.0));
        let z = zone(Direction::Bearish);
        assert!(z.close_breaches(115.1, 1.0));
        assert!(!z.close_breaches(114.5, 1.0));
    }
}
