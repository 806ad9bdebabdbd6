//! Randomized invariants of the simulator and metrics.

mod common;

use common::*;
use proptest::prelude::*;
use proptest::strategy::Strategy as PropStrategy;
use sigtrader::domain::backtest::{run_backtest, BacktestConfig};
use sigtrader::domain::strategy::Strategy;

fn closes_strategy() -> impl PropStrategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, 0..80)
}

fn signals_strategy(len: usize) -> impl PropStrategy<Value = Vec<i64>> {
    prop::collection::vec(-1i64..=1, len)
}

fn series() -> impl PropStrategy<Value = (Vec<f64>, Vec<i64>)> {
    closes_strategy().prop_flat_map(|closes| {
        let len = closes.len();
        (Just(closes), signals_strategy(len))
    })
}

fn costs() -> impl PropStrategy<Value = BacktestConfig> {
    (1_000.0f64..1_000_000.0, 0.0f64..0.01, 0.0f64..0.01).prop_map(
        |(initial_capital, commission, slippage)| BacktestConfig {
            initial_capital,
            commission,
            slippage,
        },
    )
}

proptest! {
    #[test]
    fn unsignaled_series_never_trades(closes in closes_strategy(), config in costs()) {
        let bars = make_bars(&closes);
        let result = run_backtest(&Strategy::SignalColumn, &bars, &config).unwrap();
        prop_assert!(result.trades.is_empty());
        prop_assert_eq!(result.equity_curve.len(), bars.len());
        for point in &result.equity_curve {
            prop_assert_eq!(point.portfolio_value, config.initial_capital);
        }
    }

    #[test]
    fn one_equity_point_per_bar((closes, signals) in series(), config in costs()) {
        let bars = make_signal_bars(&closes, &signals);
        let result = run_backtest(&Strategy::SignalColumn, &bars, &config).unwrap();
        prop_assert_eq!(result.equity_curve.len(), bars.len());
        for (point, bar) in result.equity_curve.iter().zip(&bars) {
            prop_assert_eq!(point.timestamp, bar.timestamp);
            prop_assert!(point.portfolio_value >= 0.0);
        }
    }

    #[test]
    fn trades_are_ordered_and_disjoint((closes, signals) in series(), config in costs()) {
        let bars = make_signal_bars(&closes, &signals);
        let result = run_backtest(&Strategy::SignalColumn, &bars, &config).unwrap();
        for trade in &result.trades {
            prop_assert!(trade.entry_time < trade.exit_time);
            prop_assert!(trade.shares > 0.0);
        }
        for pair in result.trades.windows(2) {
            prop_assert!(pair[0].exit_time <= pair[1].entry_time);
        }
    }

    #[test]
    fn frictionless_pnl_conserved((closes, signals) in series()) {
        let bars = make_signal_bars(&closes, &signals);
        let result = run_backtest(&Strategy::SignalColumn, &bars, &frictionless_config()).unwrap();
        for trade in &result.trades {
            let expected = (trade.exit_price - trade.entry_price) * trade.shares;
            prop_assert!((trade.pnl - expected).abs() <= 1e-6 * expected.abs().max(1.0));
        }
    }

    #[test]
    fn metrics_stay_in_range((closes, signals) in series(), config in costs()) {
        let bars = make_signal_bars(&closes, &signals);
        let m = run_backtest(&Strategy::SignalColumn, &bars, &config).unwrap().metrics;
        prop_assert!(m.max_drawdown <= 0.0);
        prop_assert!(m.max_drawdown >= -100.0);
        prop_assert!((0.0..=100.0).contains(&m.win_rate));
        prop_assert_eq!(m.winning_trades + m.losing_trades, m.total_trades);
        prop_assert!(m.profit_factor >= 0.0);
        prop_assert!(m.sharpe_ratio.is_finite());
    }

    #[test]
    fn runs_are_idempotent((closes, signals) in series(), config in costs()) {
        let bars = make_signal_bars(&closes, &signals);
        let first = run_backtest(&Strategy::SignalColumn, &bars, &config).unwrap();
        let second = run_backtest(&Strategy::SignalColumn, &bars, &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn indicator_strategies_emit_a_signal_per_bar(closes in closes_strategy(), period in 2usize..15) {
        let bars = make_bars(&closes);
        for strategy in [
            Strategy::MaCrossover { short_period: period / 2 + 1, long_period: period + 1 },
            Strategy::RsiMeanReversion { period, oversold: 30.0, overbought: 70.0 },
            Strategy::BollingerBreakout { period, std_dev: 2.0 },
        ] {
            let out = strategy.generate_signals(&bars);
            prop_assert_eq!(out.len(), bars.len());
            prop_assert!(out.iter().all(|b| b.signal.is_some()));
        }
    }
}
