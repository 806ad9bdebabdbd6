//! Position state and completed trades.

use chrono::NaiveDateTime;

/// Simulator position. Long-only, single asset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long {
        shares: f64,
        entry_price: f64,
        entry_time: NaiveDateTime,
    },
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long { .. })
    }

    pub fn shares(&self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long { shares, .. } => *shares,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares() * price
    }
}

/// A completed round trip. Prices are post-slippage.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    /// Price change from entry to exit in percent, fees excluded.
    pub return_pct: f64,
    /// Dollar result net of commission on both legs.
    pub pnl: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }
}
