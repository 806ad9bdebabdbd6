//! Indicator dispatch and per-series memoization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;

pub fn compute_indicator(bars: &[Bar], indicator_type: IndicatorType) -> IndicatorSeries {
    match indicator_type {
        IndicatorType::Sma(period) => calculate_sma(bars, period),
        IndicatorType::Rsi(period) => calculate_rsi(bars, period),
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        } => calculate_bollinger(bars, period, stddev_mult_x100),
    }
}

/// Memoized indicator series keyed by (kind, parameters).
///
/// A cache belongs to exactly one bar series; reusing it for different bars
/// returns stale values.
#[derive(Debug, Default, Clone)]
pub struct IndicatorCache {
    series: HashMap<IndicatorType, Arc<IndicatorSeries>>,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, bars: &[Bar], indicator_type: IndicatorType) -> Arc<IndicatorSeries> {
        self.series
            .entry(indicator_type)
            .or_insert_with(|| Arc::new(compute_indicator(bars, indicator_type)))
            .clone()
    }
}
