//! Signal-generating strategies.
//!
//! Each variant is a pure function from a bar series to the same series with
//! a signal on every bar. Indicator warmup bars get `Hold`.

use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_helpers::IndicatorCache;
use crate::domain::ohlcv::{Bar, Signal};

/// %B below this buys.
pub const PERCENT_B_BUY: f64 = 0.2;
/// %B above this sells.
pub const PERCENT_B_SELL: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Long while the short SMA is above the long SMA.
    MaCrossover {
        short_period: usize,
        long_period: usize,
    },
    /// Buy oversold RSI, sell overbought RSI.
    RsiMeanReversion {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    /// Buy near the lower band, sell near the upper band.
    BollingerBreakout { period: usize, std_dev: f64 },
    /// Use the signal column already attached to the bars.
    SignalColumn,
}

impl Strategy {
    pub fn ma_crossover() -> Self {
        Strategy::MaCrossover {
            short_period: 10,
            long_period: 50,
        }
    }

    pub fn rsi_mean_reversion() -> Self {
        Strategy::RsiMeanReversion {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }

    pub fn bollinger_breakout() -> Self {
        Strategy::BollingerBreakout {
            period: 20,
            std_dev: 2.0,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Strategy::MaCrossover {
                short_period,
                long_period,
            } => format!("MA_Crossover_{}_{}", short_period, long_period),
            Strategy::RsiMeanReversion {
                period,
                oversold,
                overbought,
            } => format!("RSI_MeanReversion_{}_{}_{}", period, oversold, overbought),
            Strategy::BollingerBreakout { period, std_dev } => {
                format!("BollingerBands_{}_{}", period, std_dev)
            }
            Strategy::SignalColumn => "SignalColumn".to_string(),
        }
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        match self {
            Strategy::MaCrossover {
                short_period,
                long_period,
            } => vec![IndicatorType::Sma(*short_period), IndicatorType::Sma(*long_period)],
            Strategy::RsiMeanReversion { period, .. } => vec![IndicatorType::Rsi(*period)],
            Strategy::BollingerBreakout { period, std_dev } => {
                vec![bollinger_type(*period, *std_dev)]
            }
            Strategy::SignalColumn => vec![],
        }
    }

    pub fn generate_signals(&self, bars: &[Bar]) -> Vec<Bar> {
        let mut cache = IndicatorCache::new();
        self.generate_signals_cached(bars, &mut cache)
    }

    /// As [`Strategy::generate_signals`], reading indicators through `cache`.
    ///
    /// `cache` must have been filled from the same `bars`.
    pub fn generate_signals_cached(&self, bars: &[Bar], cache: &mut IndicatorCache) -> Vec<Bar> {
        match self {
            Strategy::MaCrossover {
                short_period,
                long_period,
            } => {
                let short = cache.get_or_compute(bars, IndicatorType::Sma(*short_period));
                let long = cache.get_or_compute(bars, IndicatorType::Sma(*long_period));
                annotate(bars, |i, _| match (short.simple_at(i), long.simple_at(i)) {
                    (Some(s), Some(l)) if s > l => Signal::Buy,
                    (Some(s), Some(l)) if s < l => Signal::Sell,
                    _ => Signal::Hold,
                })
            }
            Strategy::RsiMeanReversion {
                period,
                oversold,
                overbought,
            } => {
                let rsi = cache.get_or_compute(bars, IndicatorType::Rsi(*period));
                annotate(bars, |i, _| match rsi.simple_at(i) {
                    Some(v) if v < *oversold => Signal::Buy,
                    Some(v) if v > *overbought => Signal::Sell,
                    _ => Signal::Hold,
                })
            }
            Strategy::BollingerBreakout { period, std_dev } => {
                let bands = cache.get_or_compute(bars, bollinger_type(*period, *std_dev));
                annotate(bars, |i, bar| match bands.bands_at(i) {
                    Some((upper, _, lower)) if upper > lower => {
                        let percent_b = (bar.close - lower) / (upper - lower);
                        if percent_b < PERCENT_B_BUY {
                            Signal::Buy
                        } else if percent_b > PERCENT_B_SELL {
                            Signal::Sell
                        } else {
                            Signal::Hold
                        }
                    }
                    _ => Signal::Hold,
                })
            }
            Strategy::SignalColumn => bars.to_vec(),
        }
    }
}

fn bollinger_type(period: usize, std_dev: f64) -> IndicatorType {
    IndicatorType::Bollinger {
        period,
        stddev_mult_x100: (std_dev * 100.0).round() as u32,
    }
}

fn annotate(bars: &[Bar], mut signal_at: impl FnMut(usize, &Bar) -> Signal) -> Vec<Bar> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| bar.with_signal(Some(signal_at(i, bar))))
        .collect()
}
