//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, StrategyResult};
use crate::domain::comparison::{
    compare_strategies, compare_strategies_parallel, ComparisonTable, SortKey,
};
use crate::domain::config_validation::{
    parse_backtest_config, parse_optional_date, validate_data_config, validate_strategy_list,
};
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::Strategy;
use crate::domain::strategy_parser;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Signal-driven strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one strategy on each configured symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy expression, e.g. "MA_CROSSOVER(5,20)"; defaults to the first configured strategy
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Directory for trade log and equity curve CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare all configured strategies side by side
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// total_return, sharpe_ratio, win_rate or profit_factor
        #[arg(long)]
        sort_by: Option<SortKey>,
        /// CSV file for the comparison table
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        parallel: bool,
    },
    /// Validate a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            strategy,
            symbol,
            start,
            end,
            output,
        } => run_backtest(
            &config,
            strategy.as_deref(),
            symbol.as_deref(),
            DateRange { start, end },
            output.as_deref(),
        ),
        Command::Compare {
            config,
            symbol,
            start,
            end,
            sort_by,
            output,
            parallel,
        } => run_compare(
            &config,
            symbol.as_deref(),
            DateRange { start, end },
            sort_by,
            output.as_deref(),
            parallel,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, data_dir } => {
            run_list_symbols(config.as_deref(), data_dir.as_deref())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

/// Optional command-line overrides for the `[data]` date range.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Fills unset bounds from the config.
    pub fn resolve(self, config: &dyn ConfigPort) -> Result<DateRange, SigtraderError> {
        let start = match self.start {
            Some(d) => Some(d),
            None => parse_optional_date(config, "start_date")?,
        };
        let end = match self.end {
            Some(d) => Some(d),
            None => parse_optional_date(config, "end_date")?,
        };
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(SigtraderError::invalid(
                    "data",
                    "start_date",
                    "start_date must not be after end_date",
                ));
            }
        }
        Ok(DateRange { start, end })
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    parse_backtest_config(config)
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<CsvAdapter, SigtraderError> {
    validate_data_config(config)?;
    let dir = config
        .get_string("data", "dir")
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(dir.trim())))
}

/// Symbols to run: the override, else `[data] symbols`, else everything the source lists.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, SigtraderError> {
    if let Some(s) = symbol_override {
        return Ok(vec![s.trim().to_string()]);
    }
    let configured = config.get_list("data", "symbols");
    if !configured.is_empty() {
        return Ok(configured);
    }
    data_port.list_symbols()
}

/// `--sort-by` wins over `[compare] sort_by`; neither means input order.
pub fn resolve_sort_key(
    sort_override: Option<SortKey>,
    config: &dyn ConfigPort,
) -> Result<Option<SortKey>, SigtraderError> {
    if sort_override.is_some() {
        return Ok(sort_override);
    }
    match config.get_string("compare", "sort_by") {
        Some(s) if !s.trim().is_empty() => s
            .parse::<SortKey>()
            .map(Some)
            .map_err(|reason| SigtraderError::invalid("compare", "sort_by", reason)),
        _ => Ok(None),
    }
}

fn fetch_symbol(
    data_port: &dyn DataPort,
    symbol: &str,
    range: DateRange,
) -> Result<Option<Vec<Bar>>, SigtraderError> {
    match data_port.fetch_bars(symbol, range.start, range.end) {
        Ok(bars) if bars.is_empty() => {
            warn!(symbol, "no bars in range, skipping");
            Ok(None)
        }
        Ok(bars) => Ok(Some(bars)),
        Err(e @ (SigtraderError::NoData { .. } | SigtraderError::DataSource { .. })) => {
            warn!(symbol, "skipping ({e})");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Runs `strategy` on every symbol that has data. Unreachable or empty symbols are
/// skipped; malformed rows abort the run.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &Strategy,
    config: &BacktestConfig,
    symbols: &[String],
    range: DateRange,
) -> Result<Vec<(String, StrategyResult)>, SigtraderError> {
    let mut results = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let Some(bars) = fetch_symbol(data_port, symbol, range)? else {
            continue;
        };
        info!(symbol = %symbol, strategy = %strategy.name(), bars = bars.len(), "running backtest");
        let result = backtest_engine::run_backtest(strategy, &bars, config)?;
        results.push((symbol.clone(), result));
    }

    if results.is_empty() {
        return Err(SigtraderError::NoData {
            symbol: symbols.join(","),
        });
    }
    Ok(results)
}

/// Compares `strategies` on every symbol that has data and concatenates the tables.
pub fn run_compare_pipeline(
    data_port: &dyn DataPort,
    strategies: &[Strategy],
    config: &BacktestConfig,
    symbols: &[String],
    range: DateRange,
    parallel: bool,
) -> Result<ComparisonTable, SigtraderError> {
    let mut tables = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let Some(bars) = fetch_symbol(data_port, symbol, range)? else {
            continue;
        };
        info!(symbol = %symbol, strategies = strategies.len(), parallel, "comparing strategies");
        let table = if parallel {
            compare_strategies_parallel(strategies, &bars, config)?
        } else {
            compare_strategies(strategies, &bars, config)?
        };
        tables.push(table.tagged(symbol));
    }

    if tables.is_empty() {
        return Err(SigtraderError::NoData {
            symbol: symbols.join(","),
        });
    }
    Ok(ComparisonTable::concat(tables))
}

pub fn format_metrics(title: &str, metrics: &Metrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", title);
    let _ = writeln!(out, "Total Return:     {:.2}%", metrics.total_return);
    let _ = writeln!(out, "Total Trades:     {}", metrics.total_trades);
    let _ = writeln!(
        out,
        "Winning/Losing:   {}/{}",
        metrics.winning_trades, metrics.losing_trades
    );
    let _ = writeln!(out, "Win Rate:         {:.1}%", metrics.win_rate);
    let _ = writeln!(out, "Avg Win:          {:.2}%", metrics.avg_win);
    let _ = writeln!(out, "Avg Loss:         {:.2}%", metrics.avg_loss);
    let _ = writeln!(out, "Profit Factor:    {:.2}", metrics.profit_factor);
    let _ = writeln!(out, "Max Drawdown:     {:.2}%", metrics.max_drawdown);
    let _ = writeln!(out, "Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    let _ = writeln!(out, "Final Value:      {:.2}", metrics.final_portfolio_value);
    out
}

pub fn format_comparison(table: &ComparisonTable) -> String {
    let strategy_width = table
        .rows
        .iter()
        .map(|r| r.strategy.len())
        .max()
        .unwrap_or(0)
        .max("Strategy".len());
    let symbol_width = table
        .rows
        .iter()
        .map(|r| r.symbol.as_deref().map_or(0, str::len))
        .max()
        .unwrap_or(0)
        .max("Symbol".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<sw$}  {:<tw$}  {:>9}  {:>6}  {:>8}  {:>8}  {:>9}  {:>7}  {:>12}",
        "Symbol",
        "Strategy",
        "Return%",
        "Trades",
        "WinRate%",
        "PF",
        "MaxDD%",
        "Sharpe",
        "FinalValue",
        sw = symbol_width,
        tw = strategy_width,
    );
    for row in &table.rows {
        let m = &row.metrics;
        let _ = writeln!(
            out,
            "{:<sw$}  {:<tw$}  {:>9.2}  {:>6}  {:>8.1}  {:>8.2}  {:>9.2}  {:>7.2}  {:>12.2}",
            row.symbol.as_deref().unwrap_or("-"),
            row.strategy,
            m.total_return,
            m.total_trades,
            m.win_rate,
            m.profit_factor,
            m.max_drawdown,
            m.sharpe_ratio,
            m.final_portfolio_value,
            sw = symbol_width,
            tw = strategy_width,
        );
    }
    out
}

fn select_strategy(
    strategy_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Strategy, SigtraderError> {
    if let Some(expr) = strategy_override {
        return strategy_parser::parse(expr).map_err(|e| {
            error!("failed to parse strategy:\n{}", e.display_with_context(expr));
            SigtraderError::from(e)
        });
    }
    let mut strategies = validate_strategy_list(config)?;
    if strategies.len() > 1 {
        warn!(
            count = strategies.len(),
            "several strategies configured, backtesting the first; use compare for all"
        );
    }
    Ok(strategies.swap_remove(0))
}

fn run_backtest(
    config_path: &Path,
    strategy_override: Option<&str>,
    symbol_override: Option<&str>,
    range: DateRange,
    output_dir: Option<&Path>,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;
    let data_port = build_data_port(&adapter)?;
    let strategy = select_strategy(strategy_override, &adapter)?;
    let range = range.resolve(&adapter)?;
    let symbols = resolve_symbols(symbol_override, &adapter, &data_port)?;

    let results = run_backtest_pipeline(&data_port, &strategy, &bt_config, &symbols, range)?;

    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)?;
    }
    let reporter = CsvReportAdapter::new();
    for (symbol, result) in &results {
        println!(
            "{}",
            format_metrics(&format!("{} {}", symbol, result.strategy_name), &result.metrics)
        );
        if let Some(dir) = output_dir {
            let stem = format!("{}_{}", symbol, result.strategy_name);
            reporter.write_trades(&result.trades, &dir.join(format!("{stem}_trades.csv")))?;
            reporter.write_equity_curve(
                &result.equity_curve,
                &dir.join(format!("{stem}_equity.csv")),
            )?;
        }
    }
    Ok(())
}

fn run_compare(
    config_path: &Path,
    symbol_override: Option<&str>,
    range: DateRange,
    sort_override: Option<SortKey>,
    output: Option<&Path>,
    parallel_flag: bool,
) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;
    let data_port = build_data_port(&adapter)?;
    let strategies = validate_strategy_list(&adapter)?;
    let sort_key = resolve_sort_key(sort_override, &adapter)?;
    let parallel = parallel_flag || adapter.get_bool("compare", "parallel", false);
    let range = range.resolve(&adapter)?;
    let symbols = resolve_symbols(symbol_override, &adapter, &data_port)?;

    let table = run_compare_pipeline(&data_port, &strategies, &bt_config, &symbols, range, parallel)?;
    let table = match sort_key {
        Some(key) => table.sorted_by(key),
        None => table,
    };

    print!("{}", format_comparison(&table));
    let key = sort_key.unwrap_or_default();
    match table.best(key) {
        Some(best) => println!(
            "\nBest by {}: {} {} ({:.2})",
            key,
            best.symbol.as_deref().unwrap_or("-"),
            best.strategy,
            key.value(&best.metrics)
        ),
        None => println!("\nNo strategy closed a trade"),
    }

    if let Some(path) = output {
        CsvReportAdapter::new().write_comparison(&table, path)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;
    validate_data_config(&adapter)?;
    let strategies = match validate_strategy_list(&adapter) {
        Ok(s) => s,
        Err(SigtraderError::StrategyParse(e)) => {
            let list = adapter.get_string("strategies", "list").unwrap_or_default();
            error!("failed to parse strategies:\n{}", e.display_with_context(&list));
            return Err(e.into());
        }
        Err(e) => return Err(e),
    };
    resolve_sort_key(None, &adapter)?;

    println!(
        "initial_capital = {}, commission = {}, slippage = {}",
        bt_config.initial_capital, bt_config.commission, bt_config.slippage
    );
    println!("Strategies:");
    for strategy in &strategies {
        println!("  {}", strategy.name());
    }
    println!("Configuration is valid.");
    Ok(())
}

fn run_list_symbols(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<(), SigtraderError> {
    let data_port = match (data_dir, config_path) {
        (Some(dir), _) => CsvAdapter::new(dir.to_path_buf()),
        (None, Some(path)) => build_data_port(&load_config(path)?)?,
        (None, None) => {
            return Err(SigtraderError::ConfigMissing {
                section: "data".to_string(),
                key: "dir".to_string(),
            });
        }
    };

    let symbols = data_port.list_symbols()?;
    if symbols.is_empty() {
        warn!("no symbols found");
    }
    for symbol in &symbols {
        match data_port.get_data_range(symbol) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", symbol, count, first, last);
            }
            Ok(None) => println!("{}: no data", symbol),
            Err(e) => warn!(symbol = %symbol, "unreadable ({e})"),
        }
    }
    info!(count = symbols.len(), "symbols found");
    Ok(())
}
