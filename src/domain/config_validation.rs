//! Configuration validation.
//!
//! Checks every config field before a backtest or comparison runs, so a bad
//! value is reported with its section and key instead of surfacing mid-run.

use crate::domain::backtest::{
    BacktestConfig, DEFAULT_COMMISSION, DEFAULT_INITIAL_CAPITAL, DEFAULT_SLIPPAGE,
};
use crate::domain::error::SigtraderError;
use crate::domain::strategy::Strategy;
use crate::domain::strategy_parser;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Builds the `[backtest]` settings. Absent keys take the engine defaults;
/// present keys must parse and be in range.
pub fn parse_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let backtest = BacktestConfig {
        initial_capital: parse_number(config, "initial_capital", DEFAULT_INITIAL_CAPITAL)?,
        commission: parse_number(config, "commission", DEFAULT_COMMISSION)?,
        slippage: parse_number(config, "slippage", DEFAULT_SLIPPAGE)?,
    };
    backtest.validate()?;
    Ok(backtest)
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_data_dir(config)?;
    validate_dates(config)?;
    Ok(())
}

/// Parses `[strategies] list`, reporting the parse error with the offending position.
pub fn validate_strategy_list(config: &dyn ConfigPort) -> Result<Vec<Strategy>, SigtraderError> {
    match config.get_string("strategies", "list") {
        Some(s) if !s.trim().is_empty() => Ok(strategy_parser::parse_list(&s)?),
        _ => Err(SigtraderError::ConfigMissing {
            section: "strategies".to_string(),
            key: "list".to_string(),
        }),
    }
}

fn parse_number(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, SigtraderError> {
    match config.get_string("backtest", key) {
        Some(s) if !s.trim().is_empty() => s.trim().parse::<f64>().map_err(|_| {
            SigtraderError::invalid(
                "backtest",
                key,
                format!("{} must be a number, got '{}'", key, s.trim()),
            )
        }),
        _ => Ok(default),
    }
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_date = parse_optional_date(config, "start_date")?;
    let end_date = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(SigtraderError::invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Reads an optional `YYYY-MM-DD` date from `[data]`; blank counts as absent.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, SigtraderError> {
    match config.get_string("data", key) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                SigtraderError::invalid(
                    "data",
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 10000.0
commission = 0.001
slippage = 0.0005
"#,
        );
        assert!(parse_backtest_config(&config).is_ok());
    }

    #[test]
    fn empty_backtest_section_uses_defaults() {
        let config = make_config("[backtest]\n");
        assert!(parse_backtest_config(&config).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = make_config("[backtest]\ninitial_capital = -100\n");
        let err = parse_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn initial_capital_zero_fails() {
        let config = make_config("[backtest]\ninitial_capital = 0\n");
        let err = parse_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn commission_negative_fails() {
        let config = make_config("[backtest]\ncommission = -0.01\n");
        let err = parse_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "commission"));
    }

    #[test]
    fn slippage_of_one_fails() {
        let config = make_config("[backtest]\nslippage = 1.0\n");
        let err = parse_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "slippage"));
    }

    #[test]
    fn unparsable_numbers_are_rejected_not_defaulted() {
        let config = make_config("[backtest]\ninitial_capital = ten thousand\n");
        let err = parse_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );

        let config = make_config("[backtest]\ncommission = 0.1%\n");
        let err = parse_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "commission"));

        let config = make_config("[backtest]\nslippage = abc\n");
        assert!(parse_backtest_config(&config).is_err());
    }

    #[test]
    fn absent_keys_take_engine_defaults() {
        let config = make_config("[backtest]\ncommission = 0.002\n");
        let parsed = parse_backtest_config(&config).unwrap();
        assert_eq!(
            parsed,
            BacktestConfig {
                initial_capital: DEFAULT_INITIAL_CAPITAL,
                commission: 0.002,
                slippage: DEFAULT_SLIPPAGE,
            }
        );
        assert_eq!(
            parse_backtest_config(&make_config("")).unwrap(),
            BacktestConfig::default()
        );
    }

    #[test]
    fn valid_data_config_passes() {
        let config = make_config(
            "[data]\ndir = ./data\nsymbols = AAPL,MSFT\nstart_date = 2020-01-01\nend_date = 2024-12-31\n",
        );
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn dates_are_optional() {
        let config = make_config("[data]\ndir = ./data\n");
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn missing_data_dir_fails() {
        let config = make_config("[data]\nsymbols = AAPL\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[data]\ndir = d\nstart_date = 2020/01/01\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config("[data]\ndir = d\nstart_date = 2024-12-31\nend_date = 2020-01-01\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn strategy_list_parses() {
        let config = make_config("[strategies]\nlist = MA_CROSSOVER(5,20), RSI\n");
        let strategies = validate_strategy_list(&config).unwrap();
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[1], Strategy::rsi_mean_reversion());
    }

    #[test]
    fn missing_strategy_list_fails() {
        let config = make_config("[strategies]\n");
        let err = validate_strategy_list(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "list"));
    }

    #[test]
    fn bad_strategy_list_is_parse_error() {
        let config = make_config("[strategies]\nlist = RSI(14, 90, 10)\n");
        let err = validate_strategy_list(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::StrategyParse(_)));
    }
}
