//! Side-by-side comparison of several strategies on one bar series.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use tracing::info;

use super::backtest::{run_backtest, run_backtest_with_cache, BacktestConfig, StrategyResult};
use super::error::SigtraderError;
use super::indicator_helpers::IndicatorCache;
use super::metrics::Metrics;
use super::ohlcv::Bar;
use super::strategy::Strategy;

/// Metric a comparison table can be ranked by. Higher is better for all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    TotalReturn,
    SharpeRatio,
    WinRate,
    ProfitFactor,
}

impl SortKey {
    pub fn value(&self, metrics: &Metrics) -> f64 {
        match self {
            SortKey::TotalReturn => metrics.total_return,
            SortKey::SharpeRatio => metrics.sharpe_ratio,
            SortKey::WinRate => metrics.win_rate,
            SortKey::ProfitFactor => metrics.profit_factor,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "total_return" | "return" => Ok(SortKey::TotalReturn),
            "sharpe_ratio" | "sharpe" => Ok(SortKey::SharpeRatio),
            "win_rate" => Ok(SortKey::WinRate),
            "profit_factor" => Ok(SortKey::ProfitFactor),
            other => Err(format!(
                "unknown sort key '{}' (expected total_return, sharpe_ratio, win_rate or profit_factor)",
                other
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::TotalReturn => "total_return",
            SortKey::SharpeRatio => "sharpe_ratio",
            SortKey::WinRate => "win_rate",
            SortKey::ProfitFactor => "profit_factor",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub symbol: Option<String>,
    pub strategy: String,
    pub metrics: Metrics,
}

impl From<&StrategyResult> for ComparisonRow {
    fn from(result: &StrategyResult) -> Self {
        ComparisonRow {
            symbol: None,
            strategy: result.strategy_name.clone(),
            metrics: result.metrics.clone(),
        }
    }
}

/// One row per strategy run, in the order the strategies were given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn new(rows: Vec<ComparisonRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy of the table sorted descending by `key`. Ties keep input order.
    pub fn sorted_by(&self, key: SortKey) -> ComparisonTable {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| key.value(&b.metrics).total_cmp(&key.value(&a.metrics)));
        ComparisonTable { rows }
    }

    /// Rows that closed at least one trade.
    pub fn active(&self) -> ComparisonTable {
        ComparisonTable {
            rows: self
                .rows
                .iter()
                .filter(|r| r.metrics.total_trades > 0)
                .cloned()
                .collect(),
        }
    }

    /// Highest-ranked active row, or `None` when no strategy traded.
    pub fn best(&self, key: SortKey) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .filter(|r| r.metrics.total_trades > 0)
            .fold(None, |best: Option<&ComparisonRow>, row| match best {
                Some(b) if key.value(&b.metrics) >= key.value(&row.metrics) => Some(b),
                _ => Some(row),
            })
    }

    pub fn tagged(mut self, symbol: &str) -> ComparisonTable {
        for row in &mut self.rows {
            row.symbol = Some(symbol.to_string());
        }
        self
    }

    pub fn concat(tables: impl IntoIterator<Item = ComparisonTable>) -> ComparisonTable {
        ComparisonTable {
            rows: tables.into_iter().flat_map(|t| t.rows).collect(),
        }
    }
}

/// Run every strategy from a fresh portfolio on the same bars.
///
/// Indicator series are shared between strategies through one cache, so two
/// strategies needing the same SMA compute it once.
pub fn compare_strategies(
    strategies: &[Strategy],
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<ComparisonTable, SigtraderError> {
    let mut cache = IndicatorCache::new();
    let mut rows = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        info!(strategy = %strategy.name(), "testing strategy");
        let result = run_backtest_with_cache(strategy, bars, config, &mut cache)?;
        rows.push(ComparisonRow::from(&result));
    }

    Ok(ComparisonTable { rows })
}

/// As [`compare_strategies`], one rayon task per strategy.
pub fn compare_strategies_parallel(
    strategies: &[Strategy],
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<ComparisonTable, SigtraderError> {
    let rows = strategies
        .par_iter()
        .map(|strategy| {
            info!(strategy = %strategy.name(), "testing strategy");
            run_backtest(strategy, bars, config).map(|r| ComparisonRow::from(&r))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ComparisonTable { rows })
}
