//! CSV report adapter: trade log, equity curve and comparison table.

use crate::domain::comparison::ComparisonTable;
use crate::domain::error::SigtraderError;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::Trade;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Serialize)]
struct TradeRecord {
    entry_time: String,
    exit_time: String,
    entry_price: f64,
    exit_price: f64,
    shares: f64,
    return_pct: f64,
    pnl: f64,
}

#[derive(Serialize)]
struct EquityRecord {
    timestamp: String,
    portfolio_value: f64,
}

#[derive(Serialize)]
struct ComparisonRecord<'a> {
    symbol: &'a str,
    strategy: &'a str,
    total_return: f64,
    total_trades: usize,
    winning_trades: usize,
    losing_trades: usize,
    win_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    profit_factor: f64,
    max_drawdown: f64,
    sharpe_ratio: f64,
    final_portfolio_value: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_records<S: Serialize>(
        records: impl IntoIterator<Item = S>,
        output_path: &Path,
    ) -> Result<usize, SigtraderError> {
        let mut writer = csv::Writer::from_path(output_path)?;
        let mut count = 0;
        for record in records {
            writer.serialize(record)?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_trades(&self, trades: &[Trade], output_path: &Path) -> Result<(), SigtraderError> {
        let rows = Self::write_records(
            trades.iter().map(|t| TradeRecord {
                entry_time: format_ts(t.entry_time),
                exit_time: format_ts(t.exit_time),
                entry_price: t.entry_price,
                exit_price: t.exit_price,
                shares: t.shares,
                return_pct: t.return_pct,
                pnl: t.pnl,
            }),
            output_path,
        )?;
        info!(path = %output_path.display(), rows, "wrote trades");
        Ok(())
    }

    fn write_equity_curve(
        &self,
        equity_curve: &[EquityPoint],
        output_path: &Path,
    ) -> Result<(), SigtraderError> {
        let rows = Self::write_records(
            equity_curve.iter().map(|p| EquityRecord {
                timestamp: format_ts(p.timestamp),
                portfolio_value: p.portfolio_value,
            }),
            output_path,
        )?;
        info!(path = %output_path.display(), rows, "wrote equity curve");
        Ok(())
    }

    fn write_comparison(
        &self,
        table: &ComparisonTable,
        output_path: &Path,
    ) -> Result<(), SigtraderError> {
        let rows = Self::write_records(
            table.rows.iter().map(|r| {
                let m = &r.metrics;
                ComparisonRecord {
                    symbol: r.symbol.as_deref().unwrap_or(""),
                    strategy: &r.strategy,
                    total_return: m.total_return,
                    total_trades: m.total_trades,
                    winning_trades: m.winning_trades,
                    losing_trades: m.losing_trades,
                    win_rate: m.win_rate,
                    avg_win: m.avg_win,
                    avg_loss: m.avg_loss,
                    profit_factor: m.profit_factor,
                    max_drawdown: m.max_drawdown,
                    sharpe_ratio: m.sharpe_ratio,
                    final_portfolio_value: m.final_portfolio_value,
                }
            }),
            output_path,
        )?;
        info!(path = %output_path.display(), rows, "wrote comparison");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::ComparisonRow;
    use crate::domain::metrics::Metrics;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn writes_trade_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        let trades = vec![Trade {
            entry_time: ts(2),
            exit_time: ts(5),
            entry_price: 100.0,
            exit_price: 110.0,
            shares: 100.0,
            return_pct: 10.0,
            pnl: 1000.0,
        }];

        CsvReportAdapter::new().write_trades(&trades, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("entry_time,exit_time,entry_price,exit_price,shares,return_pct,pnl")
        );
        assert_eq!(
            lines.next(),
            Some("2024-01-02 00:00:00,2024-01-05 00:00:00,100.0,110.0,100.0,10.0,1000.0")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn writes_equity_curve() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("equity.csv");
        let curve = vec![
            EquityPoint {
                timestamp: ts(1),
                portfolio_value: 10000.0,
            },
            EquityPoint {
                timestamp: ts(2),
                portfolio_value: 10250.5,
            },
        ];

        CsvReportAdapter::new().write_equity_curve(&curve, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "timestamp,portfolio_value\n2024-01-01 00:00:00,10000.0\n2024-01-02 00:00:00,10250.5\n"
        );
    }

    #[test]
    fn writes_comparison_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("comparison.csv");
        let metrics = Metrics::compute(&[], &[], 10000.0);
        let table = ComparisonTable::new(vec![
            ComparisonRow {
                symbol: Some("AAPL".to_string()),
                strategy: "MA_Crossover_10_50".to_string(),
                metrics: metrics.clone(),
            },
            ComparisonRow {
                symbol: None,
                strategy: "SignalColumn".to_string(),
                metrics,
            },
        ]);

        CsvReportAdapter::new().write_comparison(&table, &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), 13);
        assert_eq!(&headers[0], "symbol");
        assert_eq!(&headers[12], "final_portfolio_value");

        let records: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "AAPL");
        assert_eq!(&records[0][1], "MA_Crossover_10_50");
        assert_eq!(&records[1][0], "");
        assert_eq!(&records[1][12], "10000.0");
    }

    #[test]
    fn unwritable_path_is_error() {
        let result = CsvReportAdapter::new().write_trades(&[], Path::new("/nonexistent/dir/t.csv"));
        assert!(result.is_err());
    }
}
