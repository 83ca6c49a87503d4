//! Strategy, order, and simulator parameters.
//!
//! All validation happens at construction time via `validate()`; a
//! malformed configuration is never discovered mid-run. Runtime degeneracy
//! (zero-range retracement, empty swing set) is handled by the components
//! themselves with defined fallbacks.

use crate::domain::{Timeframe, TrailingSpec, ZoneTrigger};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors, rejected before any bar is processed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("swing lookback must be at least 1")]
    ZeroSwingLookback,

    #[error("sweep minimum penetration must be positive, got {0}")]
    NonPositivePenetration(f64),

    #[error("structure-shift confirmation buffer must be non-negative, got {0}")]
    NegativeConfirmBuffer(f64),

    #[error("zone minimum size must be positive, got {0}")]
    NonPositiveZoneSize(f64),

    #[error("zone invalidation buffer must be non-negative, got {0}")]
    NegativeInvalidationBuffer(f64),

    #[error("retracement band must satisfy 0 < lower < upper < 1, got [{lower}, {upper}]")]
    InvalidFibBand { lower: f64, upper: f64 },

    #[error("entry timeframe {entry} must be finer than structure timeframe {structure}")]
    TimeframeOrder { entry: Timeframe, structure: Timeframe },

    #[error("max concurrent setups must be at least 1")]
    ZeroCapacity,

    #[error("setup age limit must be positive, got {0} minutes")]
    NonPositiveAgeLimit(i64),

    #[error("confirmation requires at least 1 consecutive close")]
    ZeroConfirmCloses,

    #[error("session hours must be below 24, got [{start}, {end})")]
    InvalidSessionHours { start: u32, end: u32 },

    #[error("trailing stop enabled with non-positive {field} ({value})")]
    InvalidTrailing { field: &'static str, value: f64 },

    #[error("max holding period must be at least 1 bar")]
    ZeroMaxHold,

    #[error("order quantity must be positive, got {0}")]
    NonPositiveQuantity(f64),

    #[error("slippage allowance must be non-negative, got {0}")]
    NegativeSlippage(f64),

    #[error("commission must be non-negative, got {0}")]
    NegativeCommission(f64),

    #[error("point value must be positive, got {0}")]
    NonPositivePointValue(f64),
}

/// Sweep-phase detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    /// Minimum penetration beyond a level for a sweep to register.
    pub min_penetration: f64,
    /// Require the sweep bar to close back on the origin side of the level
    /// (rejection, not breakout).
    pub require_reclaim_close: bool,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self { min_penetration: 2.0, require_reclaim_close: true }
    }
}

/// Swing extraction and structure-shift parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureParams {
    /// Symmetric swing lookback: a swing needs this many strictly-dominated
    /// bars on each side.
    pub swing_lookback: usize,
    /// Close must exceed the opposing swing by this buffer to confirm a
    /// structure shift.
    pub confirm_buffer: f64,
    /// Only swings positioned within this many structure bars before the
    /// sweep are eligible for the shift check.
    pub swing_window_bars: u64,
    /// Bars allowed in the sweep phase before the setup is discarded with a
    /// distinct timeout outcome.
    pub shift_timeout_bars: u32,
}

impl Default for StructureParams {
    fn default() -> Self {
        Self {
            swing_lookback: 3,
            confirm_buffer: 2.0,
            swing_window_bars: 40,
            shift_timeout_bars: 12,
        }
    }
}

/// Which side wins when one bar both touches a zone's trigger and closes
/// beyond its invalidation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPrecedence {
    /// Conservative default: the zone counts as mitigated, the setup dies.
    MitigationFirst,
    /// The touch counts as an entry (or pending transition) first.
    EntryFirst,
}

/// Zone detection and lifecycle parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneParams {
    /// Minimum three-bar discontinuity size for a zone to exist.
    pub min_size: f64,
    /// Zone lifetime in structure bars, independent of any owning setup.
    pub max_age_bars: u64,
    pub trigger: ZoneTrigger,
    /// A close must exceed the far boundary by this much to mitigate.
    pub invalidation_buffer: f64,
    pub touch_precedence: TouchPrecedence,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            min_size: 1.0,
            max_age_bars: 96,
            trigger: ZoneTrigger::Midpoint,
            invalidation_buffer: 1.0,
            touch_precedence: TouchPrecedence::MitigationFirst,
        }
    }
}

/// Entry confirmation tier parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryParams {
    /// When true, a zone touch defers to the pending phase for wick/close
    /// confirmation; when false, a bar bracketing the trigger commits
    /// immediately.
    pub confirmation: bool,
    /// Entry-timeframe bars allowed in the pending phase before reverting
    /// to the entry-zone phase.
    pub confirm_timeout_bars: u32,
    /// Consecutive favorable closes beyond the trigger that confirm entry.
    pub closes_to_confirm: u32,
}

impl Default for EntryParams {
    fn default() -> Self {
        Self { confirmation: true, confirm_timeout_bars: 8, closes_to_confirm: 2 }
    }
}

/// Retracement admissibility band, as fractions of the sweep-to-displacement
/// range (e.g. 0.5 and 0.79).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibBand {
    pub lower: f64,
    pub upper: f64,
}

/// Setup lifetime and capacity limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleParams {
    /// Absolute age limit expressed in wall-clock minutes; converted to
    /// structure bars so coarser timeframes get proportionally fewer bars.
    pub max_setup_age_minutes: i64,
    /// Maximum concurrent setups; admitting one more evicts the oldest.
    pub max_concurrent: usize,
}

impl Default for LifecycleParams {
    fn default() -> Self {
        Self { max_setup_age_minutes: 24 * 60, max_concurrent: 8 }
    }
}

/// UTC trading-session gate for setup creation. May cross midnight
/// (start > end). Existing setups continue to advance outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl SessionWindow {
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            self.start_hour <= hour && hour < self.end_hour
        }
    }
}

/// Toggles for the non-canonical detection paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelToggles {
    /// Construct setups directly at the structure-shift phase.
    pub structure_break: bool,
    /// Construct setups directly at the entry-zone phase when a fresh zone
    /// forms within `level_proximity` of a known level.
    pub zone_revisit: bool,
    pub level_proximity: f64,
}

impl Default for ModelToggles {
    fn default() -> Self {
        Self { structure_break: false, zone_revisit: false, level_proximity: 10.0 }
    }
}

/// Full state-machine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    pub structure_tf: Timeframe,
    pub entry_tf: Timeframe,
    /// Minimum spacing between emitted entry signals; a setup confirming
    /// inside the window is consumed without producing an order.
    pub cooldown_minutes: Option<i64>,
    pub sweep: SweepParams,
    pub structure: StructureParams,
    pub zone: ZoneParams,
    pub entry: EntryParams,
    /// `None` disables the retracement admissibility filter.
    pub fib: Option<FibBand>,
    pub lifecycle: LifecycleParams,
    pub session: Option<SessionWindow>,
    pub models: ModelToggles,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            structure_tf: Timeframe::M15,
            entry_tf: Timeframe::M1,
            cooldown_minutes: None,
            sweep: SweepParams::default(),
            structure: StructureParams::default(),
            zone: ZoneParams::default(),
            entry: EntryParams::default(),
            fib: None,
            lifecycle: LifecycleParams::default(),
            session: None,
            models: ModelToggles::default(),
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.structure.swing_lookback == 0 {
            return Err(ConfigError::ZeroSwingLookback);
        }
        if self.sweep.min_penetration <= 0.0 {
            return Err(ConfigError::NonPositivePenetration(self.sweep.min_penetration));
        }
        if self.structure.confirm_buffer < 0.0 {
            return Err(ConfigError::NegativeConfirmBuffer(self.structure.confirm_buffer));
        }
        if self.zone.min_size <= 0.0 {
            return Err(ConfigError::NonPositiveZoneSize(self.zone.min_size));
        }
        if self.zone.invalidation_buffer < 0.0 {
            return Err(ConfigError::NegativeInvalidationBuffer(self.zone.invalidation_buffer));
        }
        if let Some(band) = &self.fib {
            if !(0.0 < band.lower && band.lower < band.upper && band.upper < 1.0) {
                return Err(ConfigError::InvalidFibBand { lower: band.lower, upper: band.upper });
            }
        }
        if self.entry_tf.minutes() >= self.structure_tf.minutes() {
            return Err(ConfigError::TimeframeOrder {
                entry: self.entry_tf,
                structure: self.structure_tf,
            });
        }
        if self.lifecycle.max_concurrent == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.lifecycle.max_setup_age_minutes <= 0 {
            return Err(ConfigError::NonPositiveAgeLimit(self.lifecycle.max_setup_age_minutes));
        }
        if self.entry.closes_to_confirm == 0 {
            return Err(ConfigError::ZeroConfirmCloses);
        }
        if let Some(session) = &self.session {
            if session.start_hour >= 24 || session.end_hour >= 24 {
                return Err(ConfigError::InvalidSessionHours {
                    start: session.start_hour,
                    end: session.end_hour,
                });
            }
        }
        Ok(())
    }

    /// Age limit in structure bars: coarser timeframes get proportionally
    /// fewer bars for comparable wall-clock expiry. Floored at one bar.
    pub fn expiry_bars(&self) -> u64 {
        ((self.lifecycle.max_setup_age_minutes / self.structure_tf.minutes()) as u64).max(1)
    }
}

/// Target selection for the order compiler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Fixed distance beyond entry, in points.
    FixedPoints { points: f64 },
    /// Multiple of the entry-to-stop risk.
    RiskMultiple { multiple: f64 },
}

/// Order construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderParams {
    /// Stop sits this far beyond the zone's far boundary.
    pub stop_buffer: f64,
    pub max_hold_bars: u32,
    /// Signals whose entry-to-stop risk exceeds this are rejected (counted,
    /// not an error). `None` disables the filter.
    pub max_risk_points: Option<f64>,
    pub quantity: f64,
    /// Reserved for a live adaptation; carried onto orders unchanged.
    pub entry_timeout_bars: Option<u32>,
    pub target: TargetPolicy,
    pub trailing: Option<TrailingSpec>,
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            stop_buffer: 2.0,
            max_hold_bars: 96,
            max_risk_points: Some(40.0),
            quantity: 1.0,
            entry_timeout_bars: None,
            target: TargetPolicy::RiskMultiple { multiple: 2.0 },
            trailing: None,
        }
    }
}

impl OrderParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(trailing) = &self.trailing {
            if trailing.offset <= 0.0 {
                return Err(ConfigError::InvalidTrailing {
                    field: "offset",
                    value: trailing.offset,
                });
            }
            if trailing.trigger <= 0.0 {
                return Err(ConfigError::InvalidTrailing {
                    field: "trigger",
                    value: trailing.trigger,
                });
            }
        }
        if self.max_hold_bars == 0 {
            return Err(ConfigError::ZeroMaxHold);
        }
        if self.quantity <= 0.0 {
            return Err(ConfigError::NonPositiveQuantity(self.quantity));
        }
        Ok(())
    }
}
