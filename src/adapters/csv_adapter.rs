//! CSV file data adapter.
//!
//! Reads `date,price` files. A wide file with one price column per symbol
//! (header `date,AAPL,MSFT,...`) is also accepted; the column named after
//! the requested symbol is used when no `price` column exists.

use crate::domain::bar::BarSeries;
use crate::domain::error::EngineError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    /// `path` is either a CSV file or a directory holding `<symbol>.csv` files.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(format!("{}.csv", symbol))
        } else {
            self.path.clone()
        }
    }
}

fn data_err(reason: impl Into<String>) -> EngineError {
    EngineError::DataLoad {
        reason: reason.into(),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<BarSeries, EngineError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_err(format!("CSV header error: {}", e)))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let date_col = column("date").ok_or_else(|| data_err("missing date column"))?;
        let price_col = column("price")
            .or_else(|| column(symbol))
            .ok_or_else(|| data_err(format!("no price column for {}", symbol)))?;

        let mut rows: Vec<(NaiveDate, f64)> = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(date_col)
                .ok_or_else(|| data_err("missing date column"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| data_err(format!("invalid date '{}': {}", date_str, e)))?;

            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            let raw = record.get(price_col).map(str::trim).unwrap_or("");
            if raw.is_empty() {
                // wide files leave gaps where a symbol did not trade
                warn!("{}: skipping row {} with no price for {}", path.display(), line + 2, symbol);
                continue;
            }
            let price: f64 = raw
                .parse()
                .map_err(|e| data_err(format!("invalid price '{}': {}", raw, e)))?;
            rows.push((date, price));
        }

        rows.sort_by_key(|(date, _)| *date);
        if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(data_err(format!("duplicate date {} for {}", pair[0].0, symbol)));
        }
        debug!("loaded {} bars for {} from {}", rows.len(), symbol, path.display());

        BarSeries::from_dated_prices(rows.into_iter().map(|(d, p)| (Some(d), p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("AAPL.csv"),
            "date,price\n\
             2024-01-17,115.0\n\
             2024-01-15,100.0\n\
             2024-01-16,110.0\n",
        )
        .unwrap();
        fs::write(
            path.join("wide.csv"),
            "Date,AAPL,MSFT\n\
             2024-01-15,100.0,50.0\n\
             2024-01-16,,51.0\n\
             2024-01-17,102.0,52.0\n",
        )
        .unwrap();
        fs::write(path.join("BAD.csv"), "date,price\n2024-01-15,abc\n").unwrap();
        fs::write(
            path.join("DUP.csv"),
            "date,price\n\
             2024-01-15,100.0\n\
             2024-01-16,101.0\n\
             2024-01-15,102.0\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_series_sorts_and_derives_returns() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_series("AAPL", None, None).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.prices(), vec![100.0, 110.0, 115.0]);
        assert_eq!(series.bars()[0].date, Some(date(2024, 1, 15)));
        assert_eq!(series.bars()[0].ret, None);
        assert_relative_eq!(
            series.bars()[1].ret.unwrap(),
            (110.0_f64 / 100.0).ln(),
            epsilon = 1e-12
        );
        assert_eq!(series.bars()[2].index, 2);
    }

    #[test]
    fn fetch_series_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter
            .fetch_series("AAPL", Some(date(2024, 1, 16)), Some(date(2024, 1, 16)))
            .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].date, Some(date(2024, 1, 16)));
    }

    #[test]
    fn wide_file_uses_symbol_column_and_skips_gaps() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.join("wide.csv"));

        let aapl = adapter.fetch_series("AAPL", None, None).unwrap();
        assert_eq!(aapl.prices(), vec![100.0, 102.0]);

        let msft = adapter.fetch_series("MSFT", None, None).unwrap();
        assert_eq!(msft.len(), 3);
    }

    #[test]
    fn missing_file_is_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_series("XYZ", None, None);
        assert!(matches!(result, Err(EngineError::DataLoad { .. })));
    }

    #[test]
    fn unparseable_price_is_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_series("BAD", None, None);
        assert!(matches!(result, Err(EngineError::DataLoad { .. })));
    }

    #[test]
    fn duplicate_dates_are_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series("DUP", None, None).unwrap_err();
        assert!(matches!(err, EngineError::DataLoad { .. }));
        assert!(err.to_string().contains("duplicate date 2024-01-15"));

        // filtered out by the range, so no longer a duplicate
        let series = adapter
            .fetch_series("DUP", Some(date(2024, 1, 16)), None)
            .unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn unknown_symbol_in_wide_file_is_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.join("wide.csv"));

        let result = adapter.fetch_series("GOOG", None, None);
        assert!(matches!(result, Err(EngineError::DataLoad { .. })));
    }
}
