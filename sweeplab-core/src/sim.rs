//! Historical execution simulation.
//!
//! Resolves one order plus its following bar stream to exactly one trade
//! record. Per-bar resolution runs in a fixed order — a conservative
//! worst-case-first assumption, since a single bar cannot disambiguate the
//! intrabar path:
//!
//! 1. Update the running high-water-mark.
//! 2. Activate trailing once favorable excursion reaches the trigger.
//! 3. Ratchet the active trailing level forward only, never backward.
//! 4. Test the adverse extreme against the protective stop (trailing if
//!    active, else fixed); a breach exits at that level less slippage.
//! 5. Else test the favorable extreme against the target; exit exactly at
//!    the target price (a resting limit order pays no slippage).
//! 6. Else exit at the close once the holding limit is reached.
//! 7. A stream that ends first force-closes at the last close (`data_end`,
//!    never merged with `max_hold_time`).
//!
//! The simulator is stateless across orders — independent trades may run in
//! parallel — while within one trade the high-water-mark and trailing level
//! advance strictly sequentially along the bar stream.

use crate::config::ConfigError;
use crate::domain::{Bar, ExitReason, Order, Side, TradeRecord};
use serde::{Deserialize, Serialize};

/// Fill-model parameters shared by every simulated order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Fixed slippage allowance in points, applied against the position on
    /// entry and on stop exits.
    pub slippage_points: f64,
    /// Flat cost per round trip.
    pub commission_per_trade: f64,
    /// Currency value of one point for one unit of quantity.
    pub point_value: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self { slippage_points: 0.25, commission_per_trade: 4.5, point_value: 20.0 }
    }
}

impl SimParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slippage_points < 0.0 {
            return Err(ConfigError::NegativeSlippage(self.slippage_points));
        }
        if self.commission_per_trade < 0.0 {
            return Err(ConfigError::NegativeCommission(self.commission_per_trade));
        }
        if self.point_value <= 0.0 {
            return Err(ConfigError::NonPositivePointValue(self.point_value));
        }
        Ok(())
    }
}

/// Resolve one order against the bars that follow its signal.
///
/// `bars` must start immediately after signal generation — the simulator
/// never sees the signal bar itself, so it cannot look ahead.
pub fn simulate_order(order: &Order, bars: &[Bar], params: &SimParams) -> TradeRecord {
    let sign = order.side.sign();
    // Entry fills at the trigger adjusted against the position.
    let entry_fill = order.entry + params.slippage_points * sign;

    let mut high_water_mark = entry_fill;
    let mut worst = entry_fill;
    let mut trail_level: Option<f64> = None;

    for (i, bar) in bars.iter().enumerate() {
        let bars_held = (i + 1) as u32;
        let favorable_extreme = match order.side {
            Side::Buy => bar.high,
            Side::Sell => bar.low,
        };
        let adverse_extreme = match order.side {
            Side::Buy => bar.low,
            Side::Sell => bar.high,
        };

        // Step 1: high-water-mark (and adverse excursion alongside it).
        if (favorable_extreme - high_water_mark) * sign > 0.0 {
            high_water_mark = favorable_extreme;
        }
        if (adverse_extreme - worst) * sign < 0.0 {
            worst = adverse_extreme;
        }

        if let Some(trailing) = &order.trailing {
            match trail_level {
                // Step 2: activate once favorable excursion reaches the
                // trigger distance.
                None => {
                    if (high_water_mark - entry_fill) * sign >= trailing.trigger {
                        trail_level = Some(high_water_mark - trailing.offset * sign);
                    }
                }
                // Step 3: ratchet forward only.
                Some(level) => {
                    let proposed = high_water_mark - trailing.offset * sign;
                    if (proposed - level) * sign > 0.0 {
                        trail_level = Some(proposed);
                    }
                }
            }
        }

        // Step 4: protective stop, before the target.
        let protective = trail_level.unwrap_or(order.stop);
        if (adverse_extreme - protective) * sign <= 0.0 {
            let exit_price = protective - params.slippage_points * sign;
            let reason = if trail_level.is_some() {
                ExitReason::TrailingStop
            } else {
                ExitReason::StopLoss
            };
            return finish(
                order, entry_fill, bar, exit_price, reason, bars_held, high_water_mark, worst,
                params,
            );
        }

        // Step 5: target, modeled as a resting limit order.
        if (favorable_extreme - order.target) * sign >= 0.0 {
            return finish(
                order,
                entry_fill,
                bar,
                order.target,
                ExitReason::TakeProfit,
                bars_held,
                high_water_mark,
                worst,
                params,
            );
        }

        // Step 6: holding limit.
        if bars_held >= order.max_hold_bars {
            return finish(
                order,
                entry_fill,
                bar,
                bar.close,
                ExitReason::MaxHoldTime,
                bars_held,
                high_water_mark,
                worst,
                params,
            );
        }
    }

    // Step 7: data ran out before any rule fired.
    match bars.last() {
        Some(last) => finish(
            order,
            entry_fill,
            last,
            last.close,
            ExitReason::DataEnd,
            bars.len() as u32,
            high_water_mark,
            worst,
            params,
        ),
        // Degenerate empty stream: flat close at the entry fill.
        None => TradeRecord::from_order(
            order,
            entry_fill,
            order.signal_time,
            entry_fill,
            ExitReason::DataEnd,
            0,
            entry_fill,
            0.0,
            params.point_value,
            params.commission_per_trade,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn finish(
    order: &Order,
    entry_fill: f64,
    bar: &Bar,
    exit_price: f64,
    reason: ExitReason,
    bars_held: u32,
    high_water_mark: f64,
    worst: f64,
    params: &SimParams,
) -> TradeRecord {
    let mae = (worst - entry_fill) * order.side.sign();
    TradeRecord::from_order(
        order,
        entry_fill,
        bar.close_time(),
        exit_price,
        reason,
        bars_held,
        high_water_mark,
        mae,
        params.point_value,
        params.commission_per_trade,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryModel, SetupId, Timeframe, TrailingSpec};
    use chrono::{DateTime, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap()
    }

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: base_time() + chrono::Duration::minutes(i),
            open: close,
            high,
            low,
            close,
            volume: 50.0,
            timeframe: Timeframe::M1,
        }
    }

    fn long_order() -> Order {
        Order {
            setup_id: SetupId(0),
            entry_model: EntryModel::SweepReversal,
            side: Side::Buy,
            entry: 112.5,
            stop: 105.0,
            target: 130.0,
            trailing: None,
            quantity: 1.0,
            max_hold_bars: 100,
            entry_timeout_bars: None,
            signal_time: base_time(),
        }
    }

    fn frictionless() -> SimParams {
        SimParams { slippage_points: 0.0, commission_per_trade: 0.0, point_value: 1.0 }
    }

    #[test]
    fn stop_loss_exits_at_stop_minus_slippage() {
        let order = long_order();
        let params = SimParams { slippage_points: 0.25, ..frictionless() };
        let bars = vec![bar(0, 113.0, 110.0, 111.0), bar(1, 112.0, 104.0, 106.0)];
        let trade = simulate_order(&order, &bars, &params);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!((trade.exit_price - 104.75).abs() < 1e-10); // 105 - 0.25
        assert!((trade.entry_fill - 112.75).abs() < 1e-10); // 112.5 + 0.25
        assert_eq!(trade.bars_held, 2);
    }

    #[test]
    fn target_exits_at_exact_price_without_slippage() {
        let order = long_order();
        let params = SimParams { slippage_points: 0.25, ..frictionless() };
        let bars = vec![bar(0, 120.0, 111.0, 118.0), bar(1, 131.0, 117.0, 129.0)];
        let trade = simulate_order(&order, &bars, &params);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_eq!(trade.exit_price, 130.0);
    }

    #[test]
    fn stop_takes_precedence_over_target_in_one_bar() {
        // One bar reaches both 130 and 105: worst case first.
        let order = long_order();
        let bars = vec![bar(0, 131.0, 104.0, 120.0)];
        let trade = simulate_order(&order, &bars, &frictionless());
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_price, 105.0);
    }

    #[test]
    fn max_hold_exits_at_that_bars_close() {
        let mut order = long_order();
        order.max_hold_bars = 3;
        let bars = vec![
            bar(0, 114.0, 111.0, 113.0),
            bar(1, 115.0, 112.0, 114.0),
            bar(2, 116.0, 113.0, 115.5),
            bar(3, 129.0, 114.0, 128.0), // never reached
        ];
        let trade = simulate_order(&order, &bars, &frictionless());
        assert_eq!(trade.exit_reason, ExitReason::MaxHoldTime);
        assert_eq!(trade.exit_price, 115.5);
        assert_eq!(trade.bars_held, 3);
    }

    #[test]
    fn data_end_is_distinct_from_max_hold() {
        let order = long_order(); // max_hold 100
        let bars = vec![bar(0, 114.0, 111.0, 113.0), bar(1, 115.0, 112.0, 114.5)];
        let trade = simulate_order(&order, &bars, &frictionless());
        assert_eq!(trade.exit_reason, ExitReason::DataEnd);
        assert_eq!(trade.exit_price, 114.5);
        assert_eq!(trade.bars_held, 2);
    }

    #[test]
    fn empty_stream_closes_flat_at_entry() {
        let order = long_order();
        let trade = simulate_order(&order, &[], &frictionless());
        assert_eq!(trade.exit_reason, ExitReason::DataEnd);
        assert_eq!(trade.bars_held, 0);
        assert_eq!(trade.gross_pnl, 0.0);
    }

    #[test]
    fn trailing_activates_then_ratchets_forward_only() {
        let mut order = long_order();
        order.trailing = Some(TrailingSpec { trigger: 4.0, offset: 2.0 });
        let bars = vec![
            // Excursion 4.5 >= 4.0: trail activates at 117 - 2 = 115.
            bar(0, 117.0, 115.2, 116.0),
            // HWM 119: trail ratchets to 117.
            bar(1, 119.0, 117.4, 118.0),
            // Low 116.9 breaches the 117 trail.
            bar(2, 118.0, 116.9, 117.5),
        ];
        let trade = simulate_order(&order, &bars, &frictionless());
        assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
        assert_eq!(trade.exit_price, 117.0);
        assert_eq!(trade.high_water_mark, 119.0);
        assert_eq!(trade.bars_held, 3);
    }

    #[test]
    fn trailing_never_retreats_on_pullback() {
        let mut order = long_order();
        order.trailing = Some(TrailingSpec { trigger: 4.0, offset: 2.0 });
        let bars = vec![
            bar(0, 119.0, 117.5, 118.0), // trail activates at 117
            bar(1, 118.5, 117.2, 117.5), // HWM unchanged; trail stays 117
            bar(2, 118.0, 116.5, 117.0), // low 116.5 hits the 117 trail
        ];
        let trade = simulate_order(&order, &bars, &frictionless());
        assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
        assert_eq!(trade.exit_price, 117.0);
    }

    #[test]
    fn short_side_mirrors() {
        let order = Order {
            side: Side::Sell,
            entry: 112.5,
            stop: 118.0,
            target: 100.0,
            ..long_order()
        };
        let params = SimParams { slippage_points: 0.25, ..frictionless() };
        let bars = vec![bar(0, 119.0, 110.0, 115.0)]; // high 119 breaches stop 118
        let trade = simulate_order(&order, &bars, &params);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!((trade.exit_price - 118.25).abs() < 1e-10); // 118 + 0.25
        assert!((trade.entry_fill - 112.25).abs() < 1e-10); // 112.5 - 0.25
    }

    #[test]
    fn commission_applied_once_per_round_trip() {
        let order = long_order();
        let params = SimParams { slippage_points: 0.0, commission_per_trade: 4.5, point_value: 20.0 };
        let bars = vec![bar(0, 131.0, 112.0, 129.0)];
        let trade = simulate_order(&order, &bars, &params);
        // 17.5 points * $20 = 350 gross, 345.5 net.
        assert!((trade.gross_pnl - 350.0).abs() < 1e-10);
        assert!((trade.net_pnl - 345.5).abs() < 1e-10);
        assert_eq!(trade.commission, 4.5);
    }

    #[test]
    fn excursion_tracking_fills_mae_and_mfe() {
        let order = long_order();
        let bars = vec![
            bar(0, 114.0, 108.0, 113.0), // adverse to 108
            bar(1, 120.0, 112.0, 119.0), // favorable to 120
            bar(2, 131.0, 118.0, 129.0), // target
        ];
        let trade = simulate_order(&order, &bars, &frictionless());
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert!((trade.mae - (108.0 - 112.5)).abs() < 1e-10);
        assert!((trade.mfe - (131.0 - 112.5)).abs() < 1e-10);
    }

    #[test]
    fn sim_params_validation() {
        assert!(SimParams::default().validate().is_ok());
        let bad = SimParams { slippage_points: -0.1, ..SimParams::default() };
        assert!(bad.validate().is_err());
        let bad = SimParams { point_value: 0.0, ..SimParams::default() };
        assert!(bad.validate().is_err());
    }
}
