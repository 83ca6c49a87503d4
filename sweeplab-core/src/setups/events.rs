//! Structured transition events.
//!
//! The state machine never prints; every observable change leaves the
//! engine as a `TransitionEvent` pushed into an `EventSink`. Verbosity is a
//! consumer concern: the runner records, the CLI summarizes, tests assert.

use super::phase::{RemovalReason, SetupPhase};
use crate::domain::{SetupId, ZoneId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What changed for the setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseChange {
    Created { phase: SetupPhase },
    Advanced { from: SetupPhase, to: SetupPhase },
    /// The sanctioned confirmation-timeout revert.
    Reverted { from: SetupPhase, to: SetupPhase },
    Removed { from: SetupPhase, reason: RemovalReason },
}

/// The sub-event that triggered the change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum TransitionDetail {
    SweptLevel { price: f64, penetration: f64 },
    StructureBreak { mss_level: f64 },
    ZoneFormed { zone: ZoneId, trigger_price: f64 },
    ZoneTouched { trigger_price: f64 },
    RejectionWick { trigger_price: f64 },
    ConsecutiveCloses { count: u32 },
    TriggerBracketed { trigger_price: f64 },
    ZoneMitigated { boundary: f64 },
    ZoneAgedOut { zone: ZoneId },
    ConfirmationTimeout,
    ShiftWindowElapsed { bars: u32 },
    AgedOut { age_bars: u64 },
    CapacityEviction { capacity: usize },
    CooldownActive,
}

/// One entry in the setup-transition event stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Engine-wide monotonic event counter; total order over the run.
    pub seq: u64,
    pub setup_id: SetupId,
    pub timestamp: DateTime<Utc>,
    pub change: PhaseChange,
    pub detail: TransitionDetail,
}

/// Consumer of the event stream.
pub trait EventSink {
    fn on_event(&mut self, event: &TransitionEvent);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _event: &TransitionEvent) {}
}

/// Accumulates the full stream for replay, export, and assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<TransitionEvent>,
}

impl EventSink for RecordingSink {
    fn on_event(&mut self, event: &TransitionEvent) {
        self.events.push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn recording_sink_keeps_order() {
        let mut sink = RecordingSink::default();
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap();
        for seq in 0..3 {
            sink.on_event(&TransitionEvent {
                seq,
                setup_id: SetupId(seq),
                timestamp: ts,
                change: PhaseChange::Created { phase: SetupPhase::Sweep },
                detail: TransitionDetail::SweptLevel { price: 100.0, penetration: 2.0 },
            });
        }
        assert_eq!(sink.events.len(), 3);
        assert!(sink.events.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[test]
    fn event_serialization_tags() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap();
        let event = TransitionEvent {
            seq: 9,
            setup_id: SetupId(2),
            timestamp: ts,
            change: PhaseChange::Removed {
                from: SetupPhase::EntryZone,
                reason: RemovalReason::Invalidated,
            },
            detail: TransitionDetail::ZoneMitigated { boundary: 111.0 },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"removed""#));
        assert!(json.contains(r#""reason":"invalidated""#));
        assert!(json.contains(r#""trigger":"zone_mitigated""#));
        let deser: TransitionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }
}
