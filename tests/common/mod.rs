#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sigtrader::domain::backtest::BacktestConfig;
use sigtrader::domain::error::SigtraderError;
pub use sigtrader::domain::ohlcv::{Bar, Signal};
use sigtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, SigtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(symbol)
            .ok_or_else(|| SigtraderError::NoData {
                symbol: symbol.to_string(),
            })?;
        Ok(bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.timestamp.date() >= s))
            .filter(|b| end_date.is_none_or(|e| b.timestamp.date() <= e))
            .copied()
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Midnight of the `day`-th day after 2024-01-01 (day 0).
pub fn ts(day: i64) -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::days(day)
}

pub fn make_bar(day: i64, close: f64) -> Bar {
    Bar {
        timestamp: ts(day),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000,
        signal: None,
    }
}

pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(i as i64, close))
        .collect()
}

/// Bars with an explicit signal column; `0` means no signal.
pub fn make_signal_bars(closes: &[f64], signals: &[i64]) -> Vec<Bar> {
    closes
        .iter()
        .zip(signals)
        .enumerate()
        .map(|(i, (&close, &signal))| Bar {
            signal: if signal == 0 {
                None
            } else {
                Signal::from_i64(signal)
            },
            ..make_bar(i as i64, close)
        })
        .collect()
}

/// Closes that swing up and down so every strategy kind trades.
pub fn oscillating_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 10.0 * (t / 4.0).sin() + 3.0 * (t / 1.7).cos() + 0.05 * t
        })
        .collect()
}

pub fn frictionless_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 10_000.0,
        commission: 0.0,
        slippage: 0.0,
    }
}
