//! TradeRecord — one terminal outcome per simulated order.

use super::order::{EntryModel, Order, Side};
use super::ids::SetupId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a trade exited. Exactly one reason per trade; `DataEnd` is distinct
/// from `MaxHoldTime` and the two are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
    MaxHoldTime,
    DataEnd,
}

/// A completed round-trip trade: realized entry, exit, excursion stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub setup_id: SetupId,
    pub entry_model: EntryModel,
    pub side: Side,

    // ── Entry ──
    pub entry_time: DateTime<Utc>,
    /// Nominal trigger adjusted by slippage against the position.
    pub entry_fill: f64,

    // ── Exit ──
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub bars_held: u32,

    // ── Excursion ──
    /// Best favorable price reached during the trade (price space); drives
    /// trailing-stop replay.
    pub high_water_mark: f64,
    /// Maximum favorable excursion in points (>= 0).
    pub mfe: f64,
    /// Maximum adverse excursion in points (<= 0).
    pub mae: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    /// Realized move in points, signed favorably.
    pub fn points(&self) -> f64 {
        (self.exit_price - self.entry_fill) * self.side.sign()
    }

    /// Convenience constructor carrying order identity into the record.
    pub fn from_order(
        order: &Order,
        entry_fill: f64,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        exit_reason: ExitReason,
        bars_held: u32,
        high_water_mark: f64,
        mae: f64,
        point_value: f64,
        commission: f64,
    ) -> Self {
        let points = (exit_price - entry_fill) * order.side.sign();
        let gross_pnl = points * point_value * order.quantity;
        let mfe = (high_water_mark - entry_fill) * order.side.sign();
        TradeRecord {
            setup_id: order.setup_id,
            entry_model: order.entry_model,
            side: order.side,
            entry_time: order.signal_time,
            entry_fill,
            exit_time,
            exit_price,
            exit_reason,
            bars_held,
            high_water_mark,
            mfe: mfe.max(0.0),
            mae: mae.min(0.0),
            gross_pnl,
            commission,
            net_pnl: gross_pnl - commission,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::TrailingSpec;
    use chrono::TimeZone;

    fn sample_order() -> Order {
        Order {
            setup_id: SetupId(4),
            entry_model: EntryModel::SweepReversal,
            side: Side::Buy,
            entry: 100.0,
            stop: 95.0,
            target: 110.0,
            trailing: Some(TrailingSpec { trigger: 4.0, offset: 2.0 }),
            quantity: 2.0,
            max_hold_bars: 50,
            entry_timeout_bars: None,
            signal_time: Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
        }
    }

    #[test]
    fn from_order_computes_pnl() {
        let order = sample_order();
        let exit_time = Utc.with_ymd_and_hms(2024, 3, 4, 16, 0, 0).unwrap();
        let trade = TradeRecord::from_order(
            &order, 100.25, exit_time, 110.0, ExitReason::TakeProfit, 12, 110.5, -1.5, 20.0, 4.5,
        );
        // 9.75 points * $20/pt * 2 contracts = 390, minus commission
        assert!((trade.gross_pnl - 390.0).abs() < 1e-10);
        assert!((trade.net_pnl - 385.5).abs() < 1e-10);
        assert!(trade.is_winner());
        assert!((trade.mfe - 10.25).abs() < 1e-10);
        assert_eq!(trade.mae, -1.5);
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::MaxHoldTime).unwrap();
        assert_eq!(json, r#""max_hold_time""#);
        let json = serde_json::to_string(&ExitReason::DataEnd).unwrap();
        assert_eq!(json, r#""data_end""#);
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let order = sample_order();
        let exit_time = Utc.with_ymd_and_hms(2024, 3, 4, 16, 0, 0).unwrap();
        let trade = TradeRecord::from_order(
            &order, 100.25, exit_time, 95.0, ExitReason::StopLoss, 3, 101.0, -5.25, 20.0, 4.5,
        );
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
