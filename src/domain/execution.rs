//! Trade execution and fill simulation.
//!
//! Implements entry/exit fills with adverse slippage and a proportional
//! commission charged per executed leg.

use chrono::NaiveDateTime;

use super::portfolio::Portfolio;
use super::position::{Position, Trade};

/// Fill parameters, both expressed as fractions (0.001 = 0.1%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub commission: f64,
    pub slippage: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission: 0.0,
            slippage: 0.0,
        }
    }
}

/// Commission on a traded value: trade_value * commission.
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission
}

/// Buy fill: market_price * (1 + slippage)
pub fn apply_slippage_entry(market_price: f64, slippage: f64) -> f64 {
    market_price * (1.0 + slippage)
}

/// Sell fill: market_price * (1 - slippage)
pub fn apply_slippage_exit(market_price: f64, slippage: f64) -> f64 {
    market_price * (1.0 - slippage)
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        shares: f64,
        execution_price: f64,
        commission: f64,
    },
    AlreadyLong,
    InsufficientCapital,
}

/// Enter a long position with all available cash.
///
/// 1. Apply slippage to the close
/// 2. Charge commission on the cash committed
/// 3. Convert the remaining cash into fractional shares
/// 4. Move the portfolio to `Long`, cash to zero
pub fn enter_long(
    portfolio: &mut Portfolio,
    market_price: f64,
    timestamp: NaiveDateTime,
    config: &ExecutionConfig,
) -> EntryResult {
    if portfolio.position.is_long() {
        return EntryResult::AlreadyLong;
    }
    if portfolio.cash <= 0.0 {
        return EntryResult::InsufficientCapital;
    }

    let execution_price = apply_slippage_entry(market_price, config.slippage);
    let commission = calculate_commission(portfolio.cash, config);
    let shares = (portfolio.cash - commission) / execution_price;

    if shares <= 0.0 {
        return EntryResult::InsufficientCapital;
    }

    portfolio.cash = 0.0;
    portfolio.position = Position::Long {
        shares,
        entry_price: execution_price,
        entry_time: timestamp,
    };

    EntryResult::Entered {
        shares,
        execution_price,
        commission,
    }
}

/// Result of an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub shares: f64,
    pub exit_price: f64,
    pub proceeds: f64,
    pub exit_commission: f64,
    pub pnl: f64,
}

/// Close the open long position, if any.
///
/// PnL charges commission twice, approximating the entry leg with the
/// exit-leg amount. The closed trade is appended to the portfolio.
pub fn exit_position(
    portfolio: &mut Portfolio,
    market_price: f64,
    exit_time: NaiveDateTime,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let Position::Long {
        shares,
        entry_price,
        entry_time,
    } = portfolio.position
    else {
        return None;
    };

    let exit_price = apply_slippage_exit(market_price, config.slippage);
    let proceeds = shares * exit_price;
    let exit_commission = calculate_commission(proceeds, config);

    let return_pct = (exit_price - entry_price) / entry_price * 100.0;
    let pnl = (exit_price - entry_price) * shares - 2.0 * exit_commission;

    portfolio.cash = proceeds - exit_commission;
    portfolio.position = Position::Flat;

    portfolio.record_trade(Trade {
        entry_time,
        exit_time,
        entry_price,
        exit_price,
        shares,
        return_pct,
        pnl,
    });

    Some(ExitResult {
        shares,
        exit_price,
        proceeds,
        exit_commission,
        pnl,
    })
}
