//! Setup phases as a tagged union.
//!
//! Each variant carries exactly the data valid in that phase, so a setup
//! cannot observe fields from a phase it has not reached. Transitions
//! construct a new variant; a phase, once left, is never re-entered — the
//! single sanctioned exception is the documented confirmation-timeout
//! revert from `EntryPending` back to `EntryZone`.

use crate::domain::{Bar, Direction, EntryModel, SetupId, Timeframe, ZoneId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminant-only view of the phase, for events and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupPhase {
    Sweep,
    StructureShift,
    EntryZone,
    EntryPending,
}

/// Why a setup left the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Entry confirmed; an entry signal was (or would have been) emitted.
    Entered,
    /// Absolute age limit in structure bars exceeded.
    Expired,
    /// Adverse close through the zone, or the referenced zone is gone.
    Invalidated,
    /// Capacity eviction: oldest-created goes first.
    Evicted,
    /// No qualifying structure-shift close within the timeout window.
    ShiftTimeout,
    /// Entry confirmed inside the signal cooldown window; consumed without
    /// emitting an order.
    CooldownSuppressed,
}

/// Per-phase state. Displacement extremes extend while sweeping/shifting
/// and are frozen from the entry-zone phase onward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseState {
    Sweep {
        /// The liquidity level that was swept.
        level: f64,
        /// Extreme of the sweep bar beyond the level.
        sweep_extreme: f64,
        /// Structure-bar sequence of the sweep.
        sweep_seq: u64,
        /// Favorable extreme since the sweep, still extending.
        displacement_extreme: f64,
        /// Bars evaluated in this phase, for the shift timeout.
        bars_in_phase: u32,
    },
    StructureShift {
        sweep_extreme: f64,
        sweep_seq: u64,
        /// The opposing swing level whose break confirmed the shift.
        mss_level: f64,
        /// Still extending; frozen at the entry-zone transition.
        displacement_extreme: f64,
    },
    EntryZone {
        sweep_extreme: f64,
        /// Frozen at the transition into this phase; never recomputed.
        displacement_extreme: f64,
        mss_level: Option<f64>,
        zone: ZoneId,
    },
    EntryPending {
        sweep_extreme: f64,
        displacement_extreme: f64,
        mss_level: Option<f64>,
        zone: ZoneId,
        /// Trigger captured at the touch that opened the pending window.
        trigger: f64,
        /// Entry-timeframe bars spent pending, for the confirmation
        /// deadline.
        bars_pending: u32,
        /// Current run of consecutive favorable closes beyond the trigger.
        favorable_closes: u32,
    },
}

impl PhaseState {
    pub fn phase(&self) -> SetupPhase {
        match self {
            PhaseState::Sweep { .. } => SetupPhase::Sweep,
            PhaseState::StructureShift { .. } => SetupPhase::StructureShift,
            PhaseState::EntryZone { .. } => SetupPhase::EntryZone,
            PhaseState::EntryPending { .. } => SetupPhase::EntryPending,
        }
    }

    /// Zone referenced by this phase, if any.
    pub fn zone(&self) -> Option<ZoneId> {
        match self {
            PhaseState::EntryZone { zone, .. } | PhaseState::EntryPending { zone, .. } => {
                Some(*zone)
            }
            _ => None,
        }
    }

    /// Sweep-origin extreme, present in every phase.
    pub fn sweep_extreme(&self) -> f64 {
        match self {
            PhaseState::Sweep { sweep_extreme, .. }
            | PhaseState::StructureShift { sweep_extreme, .. }
            | PhaseState::EntryZone { sweep_extreme, .. }
            | PhaseState::EntryPending { sweep_extreme, .. } => *sweep_extreme,
        }
    }

    /// Displacement extreme: live in the first two phases, frozen afterward.
    pub fn displacement_extreme(&self) -> f64 {
        match self {
            PhaseState::Sweep { displacement_extreme, .. }
            | PhaseState::StructureShift { displacement_extreme, .. }
            | PhaseState::EntryZone { displacement_extreme, .. }
            | PhaseState::EntryPending { displacement_extreme, .. } => *displacement_extreme,
        }
    }

    /// Structure-shift level, once one exists.
    pub fn mss_level(&self) -> Option<f64> {
        match self {
            PhaseState::Sweep { .. } => None,
            PhaseState::StructureShift { mss_level, .. } => Some(*mss_level),
            PhaseState::EntryZone { mss_level, .. }
            | PhaseState::EntryPending { mss_level, .. } => *mss_level,
        }
    }
}

/// One live setup instance in the engine's arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    pub id: SetupId,
    /// Explicit creation order for eviction — independent of any
    /// collection's iteration guarantees.
    pub created_seq: u64,
    pub created_at: DateTime<Utc>,
    pub direction: Direction,
    pub structure_tf: Timeframe,
    /// Assigned once an entry zone exists.
    pub entry_tf: Option<Timeframe>,
    pub entry_model: EntryModel,
    /// Structure bars since creation, for absolute expiry.
    pub age_bars: u64,
    pub state: PhaseState,
}

impl Setup {
    pub fn phase(&self) -> SetupPhase {
        self.state.phase()
    }

    /// Extend the directional displacement extreme with a structure bar.
    /// No-op once the extreme is frozen (entry-zone phase onward).
    pub fn extend_displacement(&mut self, bar: &Bar) {
        let (extreme, direction) = match &mut self.state {
            PhaseState::Sweep { displacement_extreme, .. } => {
                (displacement_extreme, self.direction)
            }
            PhaseState::StructureShift { displacement_extreme, .. } => {
                (displacement_extreme, self.direction)
            }
            _ => return,
        };
        match direction {
            Direction::Bullish => *extreme = extreme.max(bar.high),
            Direction::Bearish => *extreme = extreme.min(bar.low),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;
    use chrono::TimeZone;

    fn bar(high: f64, low: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
            open: (high + low) / 2.0,
            high,
            low,
            close: (high + low) / 2.0,
            volume: 100.0,
            timeframe: Timeframe::M15,
        }
    }

    fn setup(state: PhaseState) -> Setup {
        Setup {
            id: SetupId(0),
            created_seq: 0,
            created_at: Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap(),
            direction: Direction::Bullish,
            structure_tf: Timeframe::M15,
            entry_tf: None,
            entry_model: EntryModel::SweepReversal,
            age_bars: 0,
            state,
        }
    }

    #[test]
    fn displacement_extends_while_shifting() {
        let mut s = setup(PhaseState::StructureShift {
            sweep_extreme: 98.0,
            sweep_seq: 0,
            mss_level: 110.0,
            displacement_extreme: 112.0,
        });
        s.extend_displacement(&bar(116.0, 109.0));
        match s.state {
            PhaseState::StructureShift { displacement_extreme, .. } => {
                assert_eq!(displacement_extreme, 116.0)
            }
            _ => panic!("phase changed unexpectedly"),
        }
    }

    #[test]
    fn displacement_frozen_in_entry_zone() {
        let mut s = setup(PhaseState::EntryZone {
            sweep_extreme: 98.0,
            displacement_extreme: 116.0,
            mss_level: Some(110.0),
            zone: ZoneId(0),
        });
        s.extend_displacement(&bar(130.0, 109.0));
        match s.state {
            PhaseState::EntryZone { displacement_extreme, .. } => {
                assert_eq!(displacement_extreme, 116.0)
            }
            _ => panic!("phase changed unexpectedly"),
        }
    }

    #[test]
    fn phase_discriminant() {
        let s = setup(PhaseState::Sweep {
            level: 100.0,
            sweep_extreme: 98.0,
            sweep_seq: 0,
            displacement_extreme: 100.5,
            bars_in_phase: 0,
        });
        assert_eq!(s.phase(), SetupPhase::Sweep);
        assert_eq!(s.state.zone(), None);
    }
}
