//! CSV directory data adapter.
//!
//! Each symbol lives in `<base_path>/<SYMBOL>.csv` with the header
//! `timestamp,open,high,low,close,volume` and an optional `signal` column
//! holding 1 (buy), -1 (sell) or 0 (hold). Rows must already be in strictly
//! increasing timestamp order; a bad row is reported by its zero-based index.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::{Bar, Signal};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    signal: Option<i64>,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn malformed(index: usize, reason: String) -> SigtraderError {
    SigtraderError::MalformedInput { index, reason }
}

fn parse_timestamp(index: usize, value: &str) -> Result<NaiveDateTime, SigtraderError> {
    let value = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| malformed(index, format!("invalid timestamp '{}'", value)))
}

fn row_to_bar(index: usize, row: CsvRow) -> Result<Bar, SigtraderError> {
    let signal = match row.signal {
        None => None,
        Some(v) => Some(Signal::from_i64(v).ok_or_else(|| {
            malformed(index, format!("invalid signal value {} (expected 1, 0 or -1)", v))
        })?),
    };

    Ok(Bar {
        timestamp: parse_timestamp(index, &row.timestamp)?,
        open: row.open,
        high: row.high,
        low: row.low,
        close: row.close,
        volume: row.volume,
        signal,
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, SigtraderError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(SigtraderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| SigtraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();
        let mut previous: Option<NaiveDateTime> = None;

        for (index, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| malformed(index, format!("{}: {}", path.display(), e)))?;
            let bar = row_to_bar(index, row)?;

            if previous.is_some_and(|prev| bar.timestamp <= prev) {
                return Err(malformed(
                    index,
                    format!("timestamp {} not strictly increasing", bar.timestamp),
                ));
            }
            previous = Some(bar.timestamp);

            let date = bar.timestamp.date();
            if start_date.is_some_and(|start| date < start) || end_date.is_some_and(|end| date > end) {
                continue;
            }
            bars.push(bar);
        }

        debug!(symbol, bars = bars.len(), "loaded bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
