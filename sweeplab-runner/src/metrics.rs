//! Performance metrics — pure functions over the trade list.
//!
//! Every metric is trade list in, scalar out; no dependency on the engine
//! or the data layer. Degenerate inputs (no trades, no losers) produce
//! defined zero/capped values rather than NaN.

use serde::{Deserialize, Serialize};
use sweeplab_core::domain::{ExitReason, TradeRecord};

/// Per-reason exit counts. One bucket per variant of the closed enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitBreakdown {
    pub stop_loss: usize,
    pub trailing_stop: usize,
    pub take_profit: usize,
    pub max_hold_time: usize,
    pub data_end: usize,
}

impl ExitBreakdown {
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        let mut out = Self::default();
        for trade in trades {
            match trade.exit_reason {
                ExitReason::StopLoss => out.stop_loss += 1,
                ExitReason::TrailingStop => out.trailing_stop += 1,
                ExitReason::TakeProfit => out.take_profit += 1,
                ExitReason::MaxHoldTime => out.max_hold_time += 1,
                ExitReason::DataEnd => out.data_end += 1,
            }
        }
        out
    }

    pub fn total(&self) -> usize {
        self.stop_loss + self.trailing_stop + self.take_profit + self.max_hold_time + self.data_end
    }
}

/// Aggregate statistics for a single replay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    /// Mean net pnl per trade.
    pub expectancy: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub total_net_pnl: f64,
    pub total_commission: f64,
    /// Worst peak-to-trough dip of the cumulative net pnl curve, in
    /// currency (<= 0).
    pub max_drawdown: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub avg_bars_held: f64,
    pub avg_mae: f64,
    pub avg_mfe: f64,
    pub exits: ExitBreakdown,
}

impl PerformanceMetrics {
    /// Compute all metrics from the trade list.
    pub fn compute(trades: &[TradeRecord]) -> Self {
        Self {
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            expectancy: expectancy(trades),
            average_win: average_win(trades),
            average_loss: average_loss(trades),
            total_net_pnl: trades.iter().map(|t| t.net_pnl).sum(),
            total_commission: trades.iter().map(|t| t.commission).sum(),
            max_drawdown: max_drawdown(trades),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
            avg_bars_held: mean(trades.iter().map(|t| t.bars_held as f64)),
            avg_mae: mean(trades.iter().map(|t| t.mae)),
            avg_mfe: mean(trades.iter().map(|t| t.mfe)),
            exits: ExitBreakdown::from_trades(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of trades with positive net pnl.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profits over gross losses, capped at 100 when losses are zero.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.net_pnl > 0.0).map(|t| t.net_pnl).sum();
    let gross_loss: f64 =
        trades.iter().filter(|t| t.net_pnl < 0.0).map(|t| t.net_pnl.abs()).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Mean net pnl per trade.
pub fn expectancy(trades: &[TradeRecord]) -> f64 {
    mean(trades.iter().map(|t| t.net_pnl))
}

pub fn average_win(trades: &[TradeRecord]) -> f64 {
    mean(trades.iter().filter(|t| t.net_pnl > 0.0).map(|t| t.net_pnl))
}

/// Mean losing-trade magnitude, reported positive.
pub fn average_loss(trades: &[TradeRecord]) -> f64 {
    mean(trades.iter().filter(|t| t.net_pnl < 0.0).map(|t| t.net_pnl.abs()))
}

/// Worst peak-to-trough dip of cumulative net pnl, in trade order (<= 0).
pub fn max_drawdown(trades: &[TradeRecord]) -> f64 {
    let mut peak = 0.0_f64;
    let mut cumulative = 0.0_f64;
    let mut worst = 0.0_f64;
    for trade in trades {
        cumulative += trade.net_pnl;
        if cumulative > peak {
            peak = cumulative;
        }
        let dip = cumulative - peak;
        if dip < worst {
            worst = dip;
        }
    }
    worst
}

fn max_consecutive(trades: &[TradeRecord], winners: bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sweeplab_core::domain::{EntryModel, SetupId, Side};

    fn make_trade(net_pnl: f64, reason: ExitReason) -> TradeRecord {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap();
        TradeRecord {
            setup_id: SetupId(0),
            entry_model: EntryModel::SweepReversal,
            side: Side::Buy,
            entry_time: ts,
            entry_fill: 100.0,
            exit_time: ts,
            exit_price: 100.0 + net_pnl / 20.0,
            exit_reason: reason,
            bars_held: 10,
            high_water_mark: 101.0,
            mfe: 1.0,
            mae: -0.5,
            gross_pnl: net_pnl,
            commission: 0.0,
            net_pnl,
        }
    }

    fn win(pnl: f64) -> TradeRecord {
        make_trade(pnl, ExitReason::TakeProfit)
    }

    fn loss(pnl: f64) -> TradeRecord {
        make_trade(pnl, ExitReason::StopLoss)
    }

    #[test]
    fn win_rate_mixed() {
        let trades = vec![win(500.0), loss(-200.0), win(300.0), loss(-100.0)];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn win_rate_empty() {
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn profit_factor_mixed() {
        let trades = vec![win(500.0), loss(-200.0), win(300.0)];
        assert!((profit_factor(&trades) - 4.0).abs() < 1e-10);
    }

    #[test]
    fn profit_factor_all_winners_capped() {
        let trades = vec![win(500.0), win(300.0)];
        assert!((profit_factor(&trades) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn profit_factor_all_losers() {
        let trades = vec![loss(-500.0)];
        assert_eq!(profit_factor(&trades), 0.0);
    }

    #[test]
    fn expectancy_and_averages() {
        let trades = vec![win(600.0), loss(-200.0), win(200.0), loss(-100.0)];
        assert!((expectancy(&trades) - 125.0).abs() < 1e-10);
        assert!((average_win(&trades) - 400.0).abs() < 1e-10);
        assert!((average_loss(&trades) - 150.0).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_known() {
        // Cumulative: 500, 200, 400, -100 → peak 500, trough -100.
        let trades = vec![win(500.0), loss(-300.0), win(200.0), loss(-500.0)];
        assert!((max_drawdown(&trades) - (-600.0)).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_monotonic_gains() {
        let trades = vec![win(100.0), win(200.0)];
        assert_eq!(max_drawdown(&trades), 0.0);
    }

    #[test]
    fn consecutive_streaks() {
        let trades =
            vec![win(100.0), win(100.0), win(100.0), loss(-50.0), loss(-50.0), win(100.0)];
        let m = PerformanceMetrics::compute(&trades);
        assert_eq!(m.max_consecutive_wins, 3);
        assert_eq!(m.max_consecutive_losses, 2);
    }

    #[test]
    fn exit_breakdown_counts_every_reason_once() {
        let trades = vec![
            make_trade(100.0, ExitReason::TakeProfit),
            make_trade(-50.0, ExitReason::StopLoss),
            make_trade(30.0, ExitReason::TrailingStop),
            make_trade(-10.0, ExitReason::MaxHoldTime),
            make_trade(5.0, ExitReason::DataEnd),
        ];
        let exits = ExitBreakdown::from_trades(&trades);
        assert_eq!(exits.stop_loss, 1);
        assert_eq!(exits.trailing_stop, 1);
        assert_eq!(exits.take_profit, 1);
        assert_eq!(exits.max_hold_time, 1);
        assert_eq!(exits.data_end, 1);
        assert_eq!(exits.total(), trades.len());
    }

    #[test]
    fn compute_all_metrics_no_trades() {
        let m = PerformanceMetrics::compute(&[]);
        assert_eq!(m.trade_count, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.total_net_pnl, 0.0);
        assert_eq!(m.exits.total(), 0);
        assert!(m.expectancy.is_finite());
        assert!(m.avg_mae.is_finite());
    }
}
