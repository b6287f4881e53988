//! CSV report adapter implementing ReportPort.
//!
//! Writes `<stem>_trades.csv` (one row per executed order) and
//! `<stem>_equity.csv` (one row per bar) into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::EngineError;
use crate::domain::runner::RunResult;
use crate::ports::report_port::ReportPort;
use log::info;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn trades_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{}_trades.csv", stem))
    }

    pub fn equity_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{}_equity.csv", stem))
    }
}

fn io_err(path: &Path, e: impl std::fmt::Display) -> EngineError {
    EngineError::Io {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn date_cell(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

fn write_trades(path: &Path, result: &RunResult) -> Result<(), EngineError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| io_err(path, e))?;
    wtr.write_record([
        "bar_index",
        "date",
        "side",
        "units",
        "price",
        "cost",
        "cash_after",
        "reason",
    ])
    .map_err(|e| io_err(path, e))?;

    for t in &result.trade_log {
        wtr.write_record([
            t.bar_index.to_string(),
            date_cell(t.date),
            t.side.to_string(),
            format!("{:.6}", t.units),
            format!("{:.6}", t.price),
            format!("{:.2}", t.cost),
            format!("{:.2}", t.cash_after),
            t.reason.to_string(),
        ])
        .map_err(|e| io_err(path, e))?;
    }
    wtr.flush().map_err(|e| io_err(path, e))
}

fn write_equity(path: &Path, result: &RunResult) -> Result<(), EngineError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| io_err(path, e))?;
    wtr.write_record(["bar_index", "date", "position", "cash", "units", "equity"])
        .map_err(|e| io_err(path, e))?;

    for (point, position) in result.equity_curve.iter().zip(&result.positions) {
        wtr.write_record([
            point.bar_index.to_string(),
            date_cell(point.date),
            position.to_string(),
            format!("{:.2}", point.cash),
            format!("{:.6}", point.units),
            format!("{:.2}", point.equity),
        ])
        .map_err(|e| io_err(path, e))?;
    }
    wtr.flush().map_err(|e| io_err(path, e))
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &RunResult, output_stem: &str) -> Result<(), EngineError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| io_err(&self.output_dir, e))?;

        let trades = self.trades_path(output_stem);
        write_trades(&trades, result)?;
        let equity = self.equity_path(output_stem);
        write_equity(&equity, result)?;

        info!(
            "wrote {} and {}",
            trades.display(),
            equity.display()
        );
        Ok(())
    }
}
