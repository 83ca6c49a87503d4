//! The setup engine — owner of all concurrently active setup instances.
//!
//! Bar-advance-driven and strictly single-threaded: each structure bar is
//! applied to shared structure state (swings, zones), then every live setup
//! is evaluated against it, and only then may new setups be admitted — a
//! setup created on bar N never consumes bar N as though it were N+1.
//! Entry-timeframe bars drive zone interaction (touch, confirmation,
//! mitigation) for setups that have reached the entry-zone phase.
//!
//! Determinism: the engine reads no clock and iterates its arena in id
//! order; identical bar/level streams and configuration reproduce an
//! identical transition sequence.

use super::events::{EventSink, PhaseChange, TransitionDetail, TransitionEvent};
use super::phase::{PhaseState, RemovalReason, Setup, SetupPhase};
use crate::config::{ConfigError, StrategyParams, TouchPrecedence};
use crate::domain::{
    Bar, Direction, EntryModel, IdGen, LevelSnapshot, SetupId, SwingKind, ZoneId,
};
use crate::structure::{fib, SwingTracker, ZoneBook};
use chrono::{DateTime, Duration, Timelike, Utc};
use std::collections::{BTreeMap, VecDeque};

/// A ready-to-enter setup, handed to the order compiler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySignal {
    pub setup_id: SetupId,
    pub entry_model: EntryModel,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
    /// Confirmed entry price (the zone trigger).
    pub trigger_price: f64,
    pub zone_bottom: f64,
    pub zone_top: f64,
    pub sweep_extreme: f64,
    pub displacement_extreme: f64,
    pub mss_level: Option<f64>,
}

/// The state machine over all live setups.
pub struct SetupEngine {
    params: StrategyParams,
    ids: IdGen,
    event_seq: u64,
    /// Structure bars processed so far; the next bar gets this sequence.
    structure_seq: u64,
    /// Explicit creation counter backing oldest-first eviction.
    creation_seq: u64,
    swings: SwingTracker,
    zones: ZoneBook,
    /// Trailing three structure bars for the imbalance scan.
    recent: VecDeque<Bar>,
    /// Arena of live setups; BTreeMap gives id-ordered (creation-ordered)
    /// iteration.
    setups: BTreeMap<SetupId, Setup>,
    last_signal_time: Option<DateTime<Utc>>,
}

impl SetupEngine {
    /// Build an engine, rejecting malformed configuration up front.
    pub fn new(params: StrategyParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let retention = params.structure.swing_window_bars
            + params.structure.shift_timeout_bars as u64
            + 2 * params.structure.swing_lookback as u64
            + 8;
        Ok(Self {
            swings: SwingTracker::new(params.structure.swing_lookback, retention),
            zones: ZoneBook::new(params.zone.min_size, params.zone.max_age_bars),
            params,
            ids: IdGen::new(),
            event_seq: 0,
            structure_seq: 0,
            creation_seq: 0,
            recent: VecDeque::with_capacity(4),
            setups: BTreeMap::new(),
            last_signal_time: None,
        })
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn setup_count(&self) -> usize {
        self.setups.len()
    }

    pub fn setup(&self, id: SetupId) -> Option<&Setup> {
        self.setups.get(&id)
    }

    /// Live setups in id (creation) order.
    pub fn live_setups(&self) -> impl Iterator<Item = &Setup> {
        self.setups.values()
    }

    pub fn zones(&self) -> &ZoneBook {
        &self.zones
    }

    pub fn structure_seq(&self) -> u64 {
        self.structure_seq
    }

    /// Process one structure-timeframe bar close.
    ///
    /// Order per bar: shared structure state (swings, zone scan) → evaluate
    /// every live setup → zone flag/lifetime maintenance → admit new setups.
    pub fn on_structure_bar(
        &mut self,
        bar: &Bar,
        levels: Option<&LevelSnapshot>,
        sink: &mut dyn EventSink,
    ) {
        let seq = self.structure_seq;
        let ts = bar.close_time();

        self.swings.push(seq, bar);
        self.recent.push_back(bar.clone());
        while self.recent.len() > 3 {
            self.recent.pop_front();
        }
        let new_zone = if self.recent.len() == 3 {
            let c0 = self.recent[0].clone();
            let c1 = self.recent[1].clone();
            let c2 = self.recent[2].clone();
            self.zones.scan(&c0, &c1, &c2, seq)
        } else {
            None
        };

        // Evaluate every live setup before admitting new ones.
        let ids: Vec<SetupId> = self.setups.keys().copied().collect();
        for id in ids {
            let Some(mut setup) = self.setups.remove(&id) else { continue };
            if self.eval_structure_bar(&mut setup, bar, ts, sink) {
                self.setups.insert(id, setup);
            }
        }

        // Zone flags and lifetime advance after evaluation so that setups
        // see this bar's price action exactly once, through their own
        // checks.
        self.zones
            .observe(ts, bar.low, bar.high, bar.close, self.params.zone.invalidation_buffer);
        self.zones.prune(seq);

        if self.in_session(ts) {
            self.detect_sweeps(bar, seq, ts, levels, sink);
            if self.params.models.structure_break {
                self.detect_structure_break(bar, seq, ts, sink);
            }
            if self.params.models.zone_revisit {
                if let Some(zone_id) = new_zone {
                    self.detect_zone_revisit(zone_id, ts, levels, sink);
                }
            }
        }

        self.structure_seq += 1;
    }

    /// Process one entry-timeframe bar close. Returns entry signals
    /// confirmed by this bar.
    pub fn on_entry_bar(&mut self, bar: &Bar, sink: &mut dyn EventSink) -> Vec<EntrySignal> {
        let ts = bar.close_time();
        let mut signals = Vec::new();

        let ids: Vec<SetupId> = self.setups.keys().copied().collect();
        for id in ids {
            let Some(mut setup) = self.setups.remove(&id) else { continue };
            if self.eval_entry_bar(&mut setup, bar, ts, sink, &mut signals) {
                self.setups.insert(id, setup);
            }
        }

        // Flag maintenance after evaluation: zone fill/mitigation marks set
        // by this bar become visible from the next bar on.
        self.zones
            .observe(ts, bar.low, bar.high, bar.close, self.params.zone.invalidation_buffer);

        signals
    }

    // ── Per-setup evaluation ───────────────────────────────────────────

    /// Advance one setup against a structure bar. Returns false when the
    /// setup was removed.
    fn eval_structure_bar(
        &mut self,
        setup: &mut Setup,
        bar: &Bar,
        ts: DateTime<Utc>,
        sink: &mut dyn EventSink,
    ) -> bool {
        // Absolute expiry applies regardless of phase.
        setup.age_bars += 1;
        if setup.age_bars > self.params.expiry_bars() {
            self.emit(
                sink,
                setup.id,
                ts,
                PhaseChange::Removed { from: setup.phase(), reason: RemovalReason::Expired },
                TransitionDetail::AgedOut { age_bars: setup.age_bars },
            );
            return false;
        }

        setup.extend_displacement(bar);

        match setup.state.clone() {
            PhaseState::Sweep { level, sweep_extreme, sweep_seq, bars_in_phase, .. } => {
                // A close beyond an opposing pre-sweep swing confirms the
                // structure shift; only swings within the bounded window
                // before the sweep are eligible.
                let from = sweep_seq.saturating_sub(self.params.structure.swing_window_bars);
                let buffer = self.params.structure.confirm_buffer;
                let broken = match setup.direction {
                    Direction::Bullish => self
                        .swings
                        .swings_between(SwingKind::High, from, sweep_seq)
                        .filter(|s| bar.close >= s.price + buffer)
                        .min_by(|a, b| a.price.total_cmp(&b.price))
                        .map(|s| s.price),
                    Direction::Bearish => self
                        .swings
                        .swings_between(SwingKind::Low, from, sweep_seq)
                        .filter(|s| bar.close <= s.price - buffer)
                        .max_by(|a, b| a.price.total_cmp(&b.price))
                        .map(|s| s.price),
                };

                if let Some(mss_level) = broken {
                    let displacement_extreme = setup.state.displacement_extreme();
                    setup.state = PhaseState::StructureShift {
                        sweep_extreme,
                        sweep_seq,
                        mss_level,
                        displacement_extreme,
                    };
                    self.emit(
                        sink,
                        setup.id,
                        ts,
                        PhaseChange::Advanced {
                            from: SetupPhase::Sweep,
                            to: SetupPhase::StructureShift,
                        },
                        TransitionDetail::StructureBreak { mss_level },
                    );
                    return true;
                }

                let bars = bars_in_phase + 1;
                if bars >= self.params.structure.shift_timeout_bars {
                    // Distinct timeout outcome, not silent expiry.
                    self.emit(
                        sink,
                        setup.id,
                        ts,
                        PhaseChange::Removed {
                            from: SetupPhase::Sweep,
                            reason: RemovalReason::ShiftTimeout,
                        },
                        TransitionDetail::ShiftWindowElapsed { bars },
                    );
                    return false;
                }
                setup.state = PhaseState::Sweep {
                    level,
                    sweep_extreme,
                    sweep_seq,
                    displacement_extreme: setup.state.displacement_extreme(),
                    bars_in_phase: bars,
                };
                true
            }

            PhaseState::StructureShift { sweep_extreme, sweep_seq, mss_level, .. } => {
                // First qualifying zone: correct direction, formed within
                // the displacement span since the sweep, admissible under
                // the retracement filter.
                let displacement_extreme = setup.state.displacement_extreme();
                let trigger_mode = self.params.zone.trigger;
                let candidate = self
                    .zones
                    .eligible(setup.direction, sweep_seq)
                    .find(|z| match &self.params.fib {
                        Some(band) => fib::admissible(
                            z.trigger(trigger_mode),
                            sweep_extreme,
                            displacement_extreme,
                            setup.direction,
                            band,
                        ),
                        None => true,
                    })
                    .map(|z| (z.id, z.trigger(trigger_mode)));

                if let Some((zone_id, trigger_price)) = candidate {
                    setup.entry_tf = Some(self.params.entry_tf);
                    // Displacement is frozen here and never recomputed.
                    setup.state = PhaseState::EntryZone {
                        sweep_extreme,
                        displacement_extreme,
                        mss_level: Some(mss_level),
                        zone: zone_id,
                    };
                    self.emit(
                        sink,
                        setup.id,
                        ts,
                        PhaseChange::Advanced {
                            from: SetupPhase::StructureShift,
                            to: SetupPhase::EntryZone,
                        },
                        TransitionDetail::ZoneFormed { zone: zone_id, trigger_price },
                    );
                }
                true
            }

            // Zone phases interact with entry-timeframe bars only.
            PhaseState::EntryZone { .. } | PhaseState::EntryPending { .. } => true,
        }
    }

    /// Advance one setup against an entry bar. Returns false when the setup
    /// was removed.
    fn eval_entry_bar(
        &mut self,
        setup: &mut Setup,
        bar: &Bar,
        ts: DateTime<Utc>,
        sink: &mut dyn EventSink,
        signals: &mut Vec<EntrySignal>,
    ) -> bool {
        match setup.state.clone() {
            PhaseState::EntryZone { sweep_extreme, displacement_extreme, mss_level, zone } => {
                let Some((trigger, bottom, top, far, prior_mitigated)) = self.zone_view(zone)
                else {
                    return self.remove_for_lost_zone(setup, zone, ts, sink);
                };
                if prior_mitigated {
                    return self.remove_mitigated(setup, far, ts, sink);
                }

                let touched = bar.brackets(trigger);
                let breached =
                    self.breaches(setup.direction, bar.close, bottom, top);
                let entry_first =
                    self.params.zone.touch_precedence == TouchPrecedence::EntryFirst;

                // Same-bar conflict resolves per configured precedence.
                if breached && !(touched && entry_first) {
                    return self.remove_mitigated(setup, far, ts, sink);
                }
                if touched {
                    if self.params.entry.confirmation {
                        setup.state = PhaseState::EntryPending {
                            sweep_extreme,
                            displacement_extreme,
                            mss_level,
                            zone,
                            trigger,
                            bars_pending: 0,
                            favorable_closes: 0,
                        };
                        self.emit(
                            sink,
                            setup.id,
                            ts,
                            PhaseChange::Advanced {
                                from: SetupPhase::EntryZone,
                                to: SetupPhase::EntryPending,
                            },
                            TransitionDetail::ZoneTouched { trigger_price: trigger },
                        );
                        return true;
                    }
                    return self.confirm_entry(
                        setup,
                        ts,
                        trigger,
                        bottom,
                        top,
                        TransitionDetail::TriggerBracketed { trigger_price: trigger },
                        sink,
                        signals,
                    );
                }
                true
            }

            PhaseState::EntryPending {
                sweep_extreme,
                displacement_extreme,
                mss_level,
                zone,
                trigger,
                bars_pending,
                favorable_closes,
            } => {
                let Some((_, bottom, top, far, prior_mitigated)) = self.zone_view(zone) else {
                    return self.remove_for_lost_zone(setup, zone, ts, sink);
                };
                if prior_mitigated || self.breaches(setup.direction, bar.close, bottom, top) {
                    return self.remove_mitigated(setup, far, ts, sink);
                }

                let favorable_close = match setup.direction {
                    Direction::Bullish => bar.close > trigger,
                    Direction::Bearish => bar.close < trigger,
                };

                // Rejection wick: extreme reaches the trigger, close
                // recovers past it favorably.
                if bar.brackets(trigger) && favorable_close {
                    return self.confirm_entry(
                        setup,
                        ts,
                        trigger,
                        bottom,
                        top,
                        TransitionDetail::RejectionWick { trigger_price: trigger },
                        sink,
                        signals,
                    );
                }

                let run = if favorable_close { favorable_closes + 1 } else { 0 };
                if run >= self.params.entry.closes_to_confirm {
                    return self.confirm_entry(
                        setup,
                        ts,
                        trigger,
                        bottom,
                        top,
                        TransitionDetail::ConsecutiveCloses { count: run },
                        sink,
                        signals,
                    );
                }

                let pending = bars_pending + 1;
                if pending >= self.params.entry.confirm_timeout_bars {
                    // Deadline passed: revert, not delete — a fresh touch
                    // may retrigger. The zone is re-validated first.
                    setup.state = PhaseState::EntryZone {
                        sweep_extreme,
                        displacement_extreme,
                        mss_level,
                        zone,
                    };
                    self.emit(
                        sink,
                        setup.id,
                        ts,
                        PhaseChange::Reverted {
                            from: SetupPhase::EntryPending,
                            to: SetupPhase::EntryZone,
                        },
                        TransitionDetail::ConfirmationTimeout,
                    );
                    return true;
                }

                setup.state = PhaseState::EntryPending {
                    sweep_extreme,
                    displacement_extreme,
                    mss_level,
                    zone,
                    trigger,
                    bars_pending: pending,
                    favorable_closes: run,
                };
                true
            }

            // Pre-zone phases advance on structure bars only.
            PhaseState::Sweep { .. } | PhaseState::StructureShift { .. } => true,
        }
    }

    // ── Detection paths ────────────────────────────────────────────────

    /// Canonical path: a bar penetrating a known level by the minimum and
    /// (optionally) closing back on the origin side creates a sweep setup.
    fn detect_sweeps(
        &mut self,
        bar: &Bar,
        seq: u64,
        ts: DateTime<Utc>,
        levels: Option<&LevelSnapshot>,
        sink: &mut dyn EventSink,
    ) {
        let Some(snapshot) = levels else { return };
        let min_pen = self.params.sweep.min_penetration;
        let reclaim = self.params.sweep.require_reclaim_close;
        let mut created_bull = false;
        let mut created_bear = false;

        for level in snapshot.levels() {
            if !created_bull
                && bar.low <= level.price - min_pen
                && (!reclaim || bar.close > level.price)
                && !self.duplicate_sweep(Direction::Bullish, level.price)
            {
                let setup = self.new_setup(
                    ts,
                    Direction::Bullish,
                    EntryModel::SweepReversal,
                    PhaseState::Sweep {
                        level: level.price,
                        sweep_extreme: bar.low,
                        sweep_seq: seq,
                        displacement_extreme: bar.high,
                        bars_in_phase: 0,
                    },
                );
                self.admit(
                    setup,
                    ts,
                    TransitionDetail::SweptLevel {
                        price: level.price,
                        penetration: level.price - bar.low,
                    },
                    sink,
                );
                created_bull = true;
            }
            if !created_bear
                && bar.high >= level.price + min_pen
                && (!reclaim || bar.close < level.price)
                && !self.duplicate_sweep(Direction::Bearish, level.price)
            {
                let setup = self.new_setup(
                    ts,
                    Direction::Bearish,
                    EntryModel::SweepReversal,
                    PhaseState::Sweep {
                        level: level.price,
                        sweep_extreme: bar.high,
                        sweep_seq: seq,
                        displacement_extreme: bar.low,
                        bars_in_phase: 0,
                    },
                );
                self.admit(
                    setup,
                    ts,
                    TransitionDetail::SweptLevel {
                        price: level.price,
                        penetration: bar.high - level.price,
                    },
                    sink,
                );
                created_bear = true;
            }
            if created_bull && created_bear {
                break;
            }
        }
    }

    /// Alternate path: construct directly at the structure-shift phase when
    /// a close breaks an opposing swing with no prior sweep.
    fn detect_structure_break(
        &mut self,
        bar: &Bar,
        seq: u64,
        ts: DateTime<Utc>,
        sink: &mut dyn EventSink,
    ) {
        let from = seq.saturating_sub(self.params.structure.swing_window_bars);
        let buffer = self.params.structure.confirm_buffer;

        for direction in [Direction::Bullish, Direction::Bearish] {
            let already_live = self.setups.values().any(|s| {
                s.direction == direction
                    && s.entry_model == EntryModel::StructureBreak
                    && s.phase() == SetupPhase::StructureShift
            });
            if already_live {
                continue;
            }
            let (broken, origin) = match direction {
                Direction::Bullish => (
                    self.swings
                        .swings_between(SwingKind::High, from, seq)
                        .filter(|s| bar.close >= s.price + buffer)
                        .min_by(|a, b| a.price.total_cmp(&b.price))
                        .map(|s| s.price),
                    self.swings.latest(SwingKind::Low, seq).map(|s| s.price).unwrap_or(bar.low),
                ),
                Direction::Bearish => (
                    self.swings
                        .swings_between(SwingKind::Low, from, seq)
                        .filter(|s| bar.close <= s.price - buffer)
                        .max_by(|a, b| a.price.total_cmp(&b.price))
                        .map(|s| s.price),
                    self.swings.latest(SwingKind::High, seq).map(|s| s.price).unwrap_or(bar.high),
                ),
            };
            let Some(mss_level) = broken else { continue };
            let displacement_extreme = match direction {
                Direction::Bullish => bar.high,
                Direction::Bearish => bar.low,
            };
            let setup = self.new_setup(
                ts,
                direction,
                EntryModel::StructureBreak,
                PhaseState::StructureShift {
                    sweep_extreme: origin,
                    sweep_seq: seq,
                    mss_level,
                    displacement_extreme,
                },
            );
            self.admit(setup, ts, TransitionDetail::StructureBreak { mss_level }, sink);
        }
    }

    /// Alternate path: construct directly at the entry-zone phase when a
    /// fresh zone forms within proximity of a known level.
    fn detect_zone_revisit(
        &mut self,
        zone_id: ZoneId,
        ts: DateTime<Utc>,
        levels: Option<&LevelSnapshot>,
        sink: &mut dyn EventSink,
    ) {
        let Some(snapshot) = levels else { return };
        let Some(zone) = self.zones.get(zone_id) else { return };
        let midpoint = zone.midpoint();
        let proximity = self.params.models.level_proximity;
        if !snapshot.levels().iter().any(|l| (l.price - midpoint).abs() <= proximity) {
            return;
        }
        let direction = zone.direction;
        let trigger_price = zone.trigger(self.params.zone.trigger);
        let (sweep_extreme, displacement_extreme) = match direction {
            Direction::Bullish => (zone.bottom, zone.top),
            Direction::Bearish => (zone.top, zone.bottom),
        };
        let mut setup = self.new_setup(
            ts,
            direction,
            EntryModel::ZoneRevisit,
            PhaseState::EntryZone {
                sweep_extreme,
                displacement_extreme,
                mss_level: None,
                zone: zone_id,
            },
        );
        setup.entry_tf = Some(self.params.entry_tf);
        self.admit(setup, ts, TransitionDetail::ZoneFormed { zone: zone_id, trigger_price }, sink);
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn new_setup(
        &mut self,
        ts: DateTime<Utc>,
        direction: Direction,
        entry_model: EntryModel,
        state: PhaseState,
    ) -> Setup {
        let created_seq = self.creation_seq;
        self.creation_seq += 1;
        Setup {
            id: self.ids.next_setup(),
            created_seq,
            created_at: ts,
            direction,
            structure_tf: self.params.structure_tf,
            entry_tf: None,
            entry_model,
            age_bars: 0,
            state,
        }
    }

    /// Admit a setup, evicting the single oldest-created one first if the
    /// arena is at capacity. Eviction is centralized here, so it always
    /// sees a globally consistent creation-order view.
    fn admit(
        &mut self,
        setup: Setup,
        ts: DateTime<Utc>,
        detail: TransitionDetail,
        sink: &mut dyn EventSink,
    ) {
        let capacity = self.params.lifecycle.max_concurrent;
        if self.setups.len() >= capacity {
            let oldest = self
                .setups
                .values()
                .min_by_key(|s| s.created_seq)
                .map(|s| s.id);
            if let Some(oldest_id) = oldest {
                if let Some(evicted) = self.setups.remove(&oldest_id) {
                    self.emit(
                        sink,
                        evicted.id,
                        ts,
                        PhaseChange::Removed {
                            from: evicted.phase(),
                            reason: RemovalReason::Evicted,
                        },
                        TransitionDetail::CapacityEviction { capacity },
                    );
                }
            }
        }
        let id = setup.id;
        let phase = setup.phase();
        self.setups.insert(id, setup);
        self.emit(sink, id, ts, PhaseChange::Created { phase }, detail);
    }

    /// Entry confirmed: emit the signal unless the cooldown swallows it,
    /// then remove the setup. Always returns false.
    #[allow(clippy::too_many_arguments)]
    fn confirm_entry(
        &mut self,
        setup: &Setup,
        ts: DateTime<Utc>,
        trigger: f64,
        zone_bottom: f64,
        zone_top: f64,
        detail: TransitionDetail,
        sink: &mut dyn EventSink,
        signals: &mut Vec<EntrySignal>,
    ) -> bool {
        if let Some(cooldown) = self.params.cooldown_minutes {
            if let Some(last) = self.last_signal_time {
                if ts - last < Duration::minutes(cooldown) {
                    self.emit(
                        sink,
                        setup.id,
                        ts,
                        PhaseChange::Removed {
                            from: setup.phase(),
                            reason: RemovalReason::CooldownSuppressed,
                        },
                        TransitionDetail::CooldownActive,
                    );
                    return false;
                }
            }
        }
        self.last_signal_time = Some(ts);
        signals.push(EntrySignal {
            setup_id: setup.id,
            entry_model: setup.entry_model,
            direction: setup.direction,
            timestamp: ts,
            trigger_price: trigger,
            zone_bottom,
            zone_top,
            sweep_extreme: setup.state.sweep_extreme(),
            displacement_extreme: setup.state.displacement_extreme(),
            mss_level: setup.state.mss_level(),
        });
        self.emit(
            sink,
            setup.id,
            ts,
            PhaseChange::Removed { from: setup.phase(), reason: RemovalReason::Entered },
            detail,
        );
        false
    }

    /// Snapshot of a zone's trigger and boundaries, ending the book borrow.
    fn zone_view(&self, id: ZoneId) -> Option<(f64, f64, f64, f64, bool)> {
        self.zones.get(id).map(|z| {
            (z.trigger(self.params.zone.trigger), z.bottom, z.top, z.far_boundary(), z.mitigated)
        })
    }

    fn breaches(&self, direction: Direction, close: f64, bottom: f64, top: f64) -> bool {
        let buffer = self.params.zone.invalidation_buffer;
        match direction {
            Direction::Bullish => close < bottom - buffer,
            Direction::Bearish => close > top + buffer,
        }
    }

    fn remove_mitigated(
        &mut self,
        setup: &Setup,
        boundary: f64,
        ts: DateTime<Utc>,
        sink: &mut dyn EventSink,
    ) -> bool {
        self.emit(
            sink,
            setup.id,
            ts,
            PhaseChange::Removed { from: setup.phase(), reason: RemovalReason::Invalidated },
            TransitionDetail::ZoneMitigated { boundary },
        );
        false
    }

    fn remove_for_lost_zone(
        &mut self,
        setup: &Setup,
        zone: ZoneId,
        ts: DateTime<Utc>,
        sink: &mut dyn EventSink,
    ) -> bool {
        self.emit(
            sink,
            setup.id,
            ts,
            PhaseChange::Removed { from: setup.phase(), reason: RemovalReason::Invalidated },
            TransitionDetail::ZoneAgedOut { zone },
        );
        false
    }

    fn duplicate_sweep(&self, direction: Direction, level: f64) -> bool {
        self.setups.values().any(|s| {
            s.direction == direction
                && matches!(s.state, PhaseState::Sweep { level: l, .. } if l == level)
        })
    }

    fn in_session(&self, ts: DateTime<Utc>) -> bool {
        match &self.params.session {
            Some(window) => window.contains_hour(ts.hour()),
            None => true,
        }
    }

    fn emit(
        &mut self,
        sink: &mut dyn EventSink,
        setup_id: SetupId,
        timestamp: DateTime<Utc>,
        change: PhaseChange,
        detail: TransitionDetail,
    ) {
        let event =
            TransitionEvent { seq: self.event_seq, setup_id, timestamp, change, detail };
        self.event_seq += 1;
        sink.on_event(&event);
    }
}
