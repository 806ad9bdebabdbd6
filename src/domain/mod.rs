//! Core domain types and logic.

pub mod ohlcv;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod indicator;
pub mod indicator_helpers;
pub mod backtest;
pub mod metrics;
pub mod strategy;
pub mod strategy_parser;
pub mod comparison;
pub mod config_validation;
pub mod error;
