//! Signal-to-order compilation.
//!
//! Converts a ready-to-enter setup into a concrete order: side, entry at
//! the confirmed trigger, stop beyond the zone's far boundary, target from
//! the configured policy, optional trailing parameters, and the holding
//! limit. A risk filter rejects signals whose entry-to-stop distance is
//! non-positive or too wide — rejection is an ordinary outcome, counted by
//! the caller, never an error.

use crate::config::{ConfigError, OrderParams, TargetPolicy};
use crate::domain::{Direction, Order, Side};
use crate::setups::EntrySignal;

/// Compiles entry signals into orders under fixed parameters.
#[derive(Debug, Clone)]
pub struct OrderCompiler {
    params: OrderParams,
}

impl OrderCompiler {
    /// Build a compiler, rejecting malformed parameters up front.
    pub fn new(params: OrderParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &OrderParams {
        &self.params
    }

    /// Compile one signal. `None` means the risk filter rejected it.
    pub fn compile(&self, signal: &EntrySignal) -> Option<Order> {
        let side = Side::from_direction(signal.direction);
        let entry = signal.trigger_price;
        let stop = match signal.direction {
            Direction::Bullish => signal.zone_bottom - self.params.stop_buffer,
            Direction::Bearish => signal.zone_top + self.params.stop_buffer,
        };

        let risk = (entry - stop) * side.sign();
        if risk <= 0.0 {
            return None;
        }
        if let Some(max_risk) = self.params.max_risk_points {
            if risk > max_risk {
                return None;
            }
        }

        let reward = match self.params.target {
            TargetPolicy::FixedPoints { points } => points,
            TargetPolicy::RiskMultiple { multiple } => risk * multiple,
        };
        let target = entry + reward * side.sign();

        Some(Order {
            setup_id: signal.setup_id,
            entry_model: signal.entry_model,
            side,
            entry,
            stop,
            target,
            trailing: self.params.trailing,
            quantity: self.params.quantity,
            max_hold_bars: self.params.max_hold_bars,
            entry_timeout_bars: self.params.entry_timeout_bars,
            signal_time: signal.timestamp,
        })
    }
}
