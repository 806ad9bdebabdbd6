//! Report output port trait.

use crate::domain::comparison::ComparisonTable;
use crate::domain::error::SigtraderError;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::Trade;
use std::path::Path;

/// Port for exporting backtest results.
pub trait ReportPort {
    fn write_trades(&self, trades: &[Trade], output_path: &Path) -> Result<(), SigtraderError>;

    fn write_equity_curve(
        &self,
        equity_curve: &[EquityPoint],
        output_path: &Path,
    ) -> Result<(), SigtraderError>;

    fn write_comparison(
        &self,
        table: &ComparisonTable,
        output_path: &Path,
    ) -> Result<(), SigtraderError>;
}
