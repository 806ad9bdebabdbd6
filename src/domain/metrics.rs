//! Performance metrics and statistics.
//!
//! All trade-derived figures use closed trades only; an unrealized position
//! shows up solely through the equity curve. The Sharpe ratio is annualized
//! with 252 periods, so it is only meaningful for daily bars.

use serde::Serialize;

use super::portfolio::EquityPoint;
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub final_portfolio_value: f64,
}

impl Metrics {
    pub fn compute(trades: &[Trade], equity_curve: &[EquityPoint], initial_capital: f64) -> Self {
        let final_portfolio_value = equity_curve
            .last()
            .map(|p| p.portfolio_value)
            .unwrap_or(initial_capital);

        let total_trades = trades.len();
        if total_trades == 0 {
            return Metrics {
                total_return: 0.0,
                total_trades: 0,
                winning_trades: 0,
                losing_trades: 0,
                win_rate: 0.0,
                avg_win: 0.0,
                avg_loss: 0.0,
                profit_factor: 0.0,
                max_drawdown: 0.0,
                sharpe_ratio: 0.0,
                final_portfolio_value,
            };
        }

        let total_return = (final_portfolio_value - initial_capital) / initial_capital * 100.0;

        let (winners, losers): (Vec<&Trade>, Vec<&Trade>) =
            trades.iter().partition(|t| t.is_winner());

        let winning_trades = winners.len();
        let losing_trades = losers.len();
        let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;

        let avg_win = mean_return(&winners);
        let avg_loss = mean_return(&losers);
        let profit_factor = compute_profit_factor(&winners, &losers);

        Metrics {
            total_return,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            avg_win,
            avg_loss,
            profit_factor,
            max_drawdown: compute_max_drawdown(equity_curve),
            sharpe_ratio: compute_sharpe(equity_curve),
            final_portfolio_value,
        }
    }
}

fn mean_return(trades: &[&Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.return_pct).sum::<f64>() / trades.len() as f64
}

/// Gross winning pnl over gross losing pnl.
///
/// With no losing trades the denominator is taken as 1, so the result equals
/// the summed winning pnl rather than infinity.
fn compute_profit_factor(winners: &[&Trade], losers: &[&Trade]) -> f64 {
    let total_wins: f64 = winners.iter().map(|t| t.pnl).sum();
    let total_losses = if losers.is_empty() {
        1.0
    } else {
        losers.iter().map(|t| t.pnl).sum::<f64>().abs()
    };

    if total_losses != 0.0 {
        total_wins / total_losses
    } else {
        0.0
    }
}

/// Most negative percentage distance from the running peak. Always <= 0.
fn compute_max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.portfolio_value;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.portfolio_value > peak {
            peak = point.portfolio_value;
        }
        if peak > 0.0 {
            let dd = (point.portfolio_value - peak) / peak * 100.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Annualized mean/stdev of period-over-period changes, sample stdev (n - 1).
fn compute_sharpe(equity_curve: &[EquityPoint]) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].portfolio_value;
            let curr = w[1].portfolio_value;
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 && stddev.is_finite() {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
