//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses a plain rolling mean of gains and losses (not Wilder's smoothing).
//! The change at the first bar is taken as zero, so the window for bar
//! `period-1` already yields a value.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 when avg_gain > 0, otherwise undefined (invalid).
//!
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> IndicatorSeries {
    let mut gains: Vec<f64> = Vec::with_capacity(bars.len());
    let mut losses: Vec<f64> = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let change = if i == 0 {
            0.0
        } else {
            bars[i].close - bars[i - 1].close
        };
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let rsi = if period > 0 && i + 1 >= period {
            let start = i + 1 - period;
            let avg_gain = gains[start..=i].iter().sum::<f64>() / period as f64;
            let avg_loss = losses[start..=i].iter().sum::<f64>() / period as f64;
            if avg_loss == 0.0 {
                if avg_gain > 0.0 { Some(100.0) } else { None }
            } else {
                Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
            }
        } else {
            None
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: rsi.is_some(),
            value: IndicatorValue::Simple(rsi.unwrap_or(0.0)),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<Bar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
                signal: None,
            })
            .collect()
    }

    #[test]
    fn rsi_warmup() {
        let series = calculate_rsi(&make_bars(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let series = calculate_rsi(&make_bars(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(series.simple_at(3), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let series = calculate_rsi(&make_bars(&[4.0, 3.0, 2.0, 1.0]), 3);
        let v = series.simple_at(3).unwrap();
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn rsi_balanced_moves_is_50() {
        let series = calculate_rsi(&make_bars(&[1.0, 2.0, 1.0, 2.0]), 2);
        assert_eq!(series.simple_at(1), Some(100.0));
        assert!((series.simple_at(2).unwrap() - 50.0).abs() < 1e-9);
        assert!((series.simple_at(3).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_flat_prices_undefined() {
        let series = calculate_rsi(&make_bars(&[5.0, 5.0, 5.0]), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_period_zero() {
        let series = calculate_rsi(&make_bars(&[1.0, 2.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).values.is_empty());
    }
}
