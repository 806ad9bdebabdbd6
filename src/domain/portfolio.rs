//! Portfolio state and equity tracking.

use chrono::NaiveDateTime;

use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub portfolio_value: f64,
}

/// State owned by a single simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Position,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: Position::Flat,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, portfolio_value: f64) {
        self.equity_curve.push(EquityPoint {
            timestamp,
            portfolio_value,
        });
    }

    /// cash + shares * close; reduces to cash when flat.
    pub fn total_equity(&self, close: f64) -> f64 {
        self.cash + self.position.market_value(close)
    }
}
