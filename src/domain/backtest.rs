//! Backtest engine and event loop.
//!
//! `run_simulation` walks a signal-annotated bar series once, in order, and
//! turns signals into fills against a single long-only position. Every bar
//! produces one equity point whether or not it traded.

use tracing::debug;

use super::error::SigtraderError;
use super::execution::{enter_long, exit_position, EntryResult, ExecutionConfig};
use super::indicator_helpers::IndicatorCache;
use super::metrics::Metrics;
use super::ohlcv::{Bar, Signal};
use super::portfolio::{EquityPoint, Portfolio};
use super::position::Trade;
use super::strategy::Strategy;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_COMMISSION: f64 = 0.001;
pub const DEFAULT_SLIPPAGE: f64 = 0.0005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of traded value charged per leg.
    pub commission: f64,
    /// Fraction applied adversely to the fill price on entry and exit.
    pub slippage: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission: DEFAULT_COMMISSION,
            slippage: DEFAULT_SLIPPAGE,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SigtraderError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(SigtraderError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if !is_unit_fraction(self.commission) {
            return Err(SigtraderError::invalid(
                "backtest",
                "commission",
                "commission must be in [0, 1)",
            ));
        }
        if !is_unit_fraction(self.slippage) {
            return Err(SigtraderError::invalid(
                "backtest",
                "slippage",
                "slippage must be in [0, 1)",
            ));
        }
        Ok(())
    }

    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission: self.commission,
            slippage: self.slippage,
        }
    }
}

fn is_unit_fraction(value: f64) -> bool {
    (0.0..1.0).contains(&value)
}

/// Rejects series with non-positive prices or timestamps that are not strictly increasing.
pub fn validate_bars(bars: &[Bar]) -> Result<(), SigtraderError> {
    for (index, bar) in bars.iter().enumerate() {
        if let Some(field) = bar.invalid_price_field() {
            return Err(SigtraderError::MalformedInput {
                index,
                reason: format!("{field} must be a positive number"),
            });
        }
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(SigtraderError::MalformedInput {
                index,
                reason: format!(
                    "timestamp {} is not after {}",
                    bar.timestamp,
                    bars[index - 1].timestamp
                ),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
}

impl BacktestResult {
    pub fn trades(&self) -> &[Trade] {
        &self.portfolio.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.portfolio.equity_curve
    }
}

/// Simulate fills for a signal-annotated series.
///
/// A long position still open after the last bar stays open; it is marked to
/// market in the equity curve but produces no trade.
pub fn run_simulation(bars: &[Bar], config: &BacktestConfig) -> Result<BacktestResult, SigtraderError> {
    config.validate()?;
    validate_bars(bars)?;

    let exec = config.execution();
    let mut portfolio = Portfolio::new(config.initial_capital);

    for bar in bars {
        match bar.signal {
            Some(Signal::Buy) if portfolio.position.is_flat() => {
                if let EntryResult::Entered {
                    shares,
                    execution_price,
                    commission,
                } = enter_long(&mut portfolio, bar.close, bar.timestamp, &exec)
                {
                    debug!(timestamp = %bar.timestamp, shares, price = execution_price, commission, "entered long");
                }
            }
            Some(Signal::Sell | Signal::Hold) if portfolio.position.is_long() => {
                if let Some(exit) = exit_position(&mut portfolio, bar.close, bar.timestamp, &exec) {
                    debug!(
                        timestamp = %bar.timestamp,
                        shares = exit.shares,
                        price = exit.exit_price,
                        proceeds = exit.proceeds,
                        commission = exit.exit_commission,
                        pnl = exit.pnl,
                        "exited long"
                    );
                }
            }
            _ => {}
        }

        let value = portfolio.total_equity(bar.close);
        portfolio.record_equity(bar.timestamp, value);
    }

    Ok(BacktestResult { portfolio })
}

/// Outcome of one strategy run: trades, equity curve and summary metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub strategy_name: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
}

/// Generate signals, simulate and compute metrics for a single strategy.
pub fn run_backtest(
    strategy: &Strategy,
    bars: &[Bar],
    config: &BacktestConfig,
) -> Result<StrategyResult, SigtraderError> {
    let mut cache = IndicatorCache::new();
    run_backtest_with_cache(strategy, bars, config, &mut cache)
}

/// As [`run_backtest`], reusing indicator series already computed for `bars`.
pub fn run_backtest_with_cache(
    strategy: &Strategy,
    bars: &[Bar],
    config: &BacktestConfig,
    cache: &mut IndicatorCache,
) -> Result<StrategyResult, SigtraderError> {
    config.validate()?;
    let signaled = strategy.generate_signals_cached(bars, cache);
    let result = run_simulation(&signaled, config)?;
    let metrics = Metrics::compute(
        result.trades(),
        result.equity_curve(),
        config.initial_capital,
    );

    let BacktestResult { portfolio } = result;
    Ok(StrategyResult {
        strategy_name: strategy.name(),
        trades: portfolio.trades,
        equity_curve: portfolio.equity_curve,
        metrics,
    })
}
