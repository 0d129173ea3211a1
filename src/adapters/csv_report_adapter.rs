//! CSV report adapter implementing ReportPort.
//!
//! Writes `equity_curve.csv`, `trades.csv` and `positions.csv` into the
//! output directory, creating it if needed.

use std::fs;
use std::path::Path;

use crate::domain::error::FactorlabError;
use crate::domain::simulation::SimulationResult;
use crate::ports::report_port::ReportPort;

pub const EQUITY_FILE: &str = "equity_curve.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const POSITIONS_FILE: &str = "positions.csv";

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn writer(path: &Path) -> Result<csv::Writer<fs::File>, FactorlabError> {
        csv::Writer::from_path(path).map_err(|e| csv_error(path, e))
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(path: &Path, err: csv::Error) -> FactorlabError {
    FactorlabError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        err
    )))
}

fn write_equity_curve(result: &SimulationResult, path: &Path) -> Result<(), FactorlabError> {
    let mut wtr = CsvReportAdapter::writer(path)?;
    wtr.write_record(["date", "portfolio_value", "cash", "positions_value"])
        .map_err(|e| csv_error(path, e))?;
    for record in &result.equity_curve {
        wtr.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            record.portfolio_value.to_string(),
            record.cash.to_string(),
            record.positions_value.to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_trades(result: &SimulationResult, path: &Path) -> Result<(), FactorlabError> {
    let mut wtr = CsvReportAdapter::writer(path)?;
    wtr.write_record(["date", "ticker", "shares", "price", "side"])
        .map_err(|e| csv_error(path, e))?;
    for trade in &result.trades {
        wtr.write_record([
            trade.date.format("%Y-%m-%d").to_string(),
            trade.ticker.clone(),
            trade.shares.to_string(),
            trade.price.to_string(),
            trade.side.as_str().to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_positions(result: &SimulationResult, path: &Path) -> Result<(), FactorlabError> {
    let mut wtr = CsvReportAdapter::writer(path)?;
    wtr.write_record(["date", "ticker", "shares", "value"])
        .map_err(|e| csv_error(path, e))?;
    for snapshot in &result.positions_history {
        wtr.write_record([
            snapshot.date.format("%Y-%m-%d").to_string(),
            snapshot.ticker.clone(),
            snapshot.shares.to_string(),
            snapshot.value.to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &SimulationResult, output_dir: &Path) -> Result<(), FactorlabError> {
        fs::create_dir_all(output_dir)?;
        write_equity_curve(result, &output_dir.join(EQUITY_FILE))?;
        write_trades(result, &output_dir.join(TRADES_FILE))?;
        write_positions(result, &output_dir.join(POSITIONS_FILE))?;
        Ok(())
    }
}
