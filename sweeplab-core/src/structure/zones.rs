//! Three-bar imbalance detection and the zone book.
//!
//! For consecutive structure bars `(c0, c1, c2)`, a bullish zone exists when
//! `c2.low - c0.high` exceeds the minimum size and `c1` closed above its
//! open (mirror for bearish). Top and bottom are the outer bars' prices;
//! the midpoint is the canonical re-entry trigger.
//!
//! Zones live in the book with their own lifetime, measured in structure
//! bars independently of any setup that references them. Fill and
//! mitigation flags make a zone ineligible for new setups; physical removal
//! happens only on age, so a live setup's reference stays valid while the
//! zone is within its lifetime.

use crate::domain::{Bar, Direction, IdGen, Zone, ZoneId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Pure three-bar scan. Returns direction and interval, or `None` — absence
/// of a zone is the expected common case.
pub fn detect_imbalance(c0: &Bar, c1: &Bar, c2: &Bar, min_size: f64) -> Option<(Direction, f64, f64)> {
    if c2.low - c0.high >= min_size && c1.is_bullish() {
        return Some((Direction::Bullish, c0.high, c2.low));
    }
    if c0.low - c2.high >= min_size && c1.is_bearish() {
        return Some((Direction::Bearish, c2.high, c0.low));
    }
    None
}

/// Registry of live zones with id-ordered iteration.
#[derive(Debug, Clone)]
pub struct ZoneBook {
    zones: BTreeMap<ZoneId, Zone>,
    ids: IdGen,
    max_age_bars: u64,
    min_size: f64,
}

impl ZoneBook {
    pub fn new(min_size: f64, max_age_bars: u64) -> Self {
        Self { zones: BTreeMap::new(), ids: IdGen::new(), max_age_bars, min_size }
    }

    /// Scan the trailing three-bar window ending at `c2` (the bar with
    /// sequence `seq`) and register any new zone. The zone's creation
    /// timestamp is `c2`'s close — it exists only once the pattern is
    /// complete.
    pub fn scan(&mut self, c0: &Bar, c1: &Bar, c2: &Bar, seq: u64) -> Option<ZoneId> {
        let (direction, bottom, top) = detect_imbalance(c0, c1, c2, self.min_size)?;
        let id = self.ids.next_zone();
        self.zones.insert(
            id,
            Zone {
                id,
                direction,
                bottom,
                top,
                created_at: c2.close_time(),
                created_seq: seq,
                filled: false,
                mitigated: false,
            },
        );
        Some(id)
    }

    /// Update fill/mitigation flags from a bar on any timeframe. Only bars
    /// strictly after a zone's creation can fill it.
    pub fn observe(
        &mut self,
        ts: DateTime<Utc>,
        low: f64,
        high: f64,
        close: f64,
        invalidation_buffer: f64,
    ) {
        for zone in self.zones.values_mut() {
            if ts <= zone.created_at {
                continue;
            }
            let trigger = zone.midpoint();
            if !zone.filled && low <= trigger && trigger <= high {
                zone.filled = true;
            }
            if !zone.mitigated && zone.close_breaches(close, invalidation_buffer) {
                zone.mitigated = true;
            }
        }
    }

    /// Drop zones older than the maximum lifetime.
    pub fn prune(&mut self, current_seq: u64) {
        let max_age = self.max_age_bars;
        self.zones.retain(|_, z| current_seq.saturating_sub(z.created_seq) <= max_age);
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    /// Live zones in id (creation) order.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Zones eligible for attachment to a new or advancing setup: matching
    /// direction, neither filled nor mitigated, created at or after
    /// `from_seq`.
    pub fn eligible(&self, direction: Direction, from_seq: u64) -> impl Iterator<Item = &Zone> {
        self.zones.values().filter(move |z| {
            z.direction == direction && !z.filled && !z.mitigated && z.created_seq >= from_seq
        })
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
