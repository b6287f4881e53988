#![allow(dead_code)]

use chrono::NaiveDate;
use eventbt::domain::bar::BarSeries;
use eventbt::domain::error::EngineError;
use eventbt::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;

pub struct MockDataPort {
    pub data: HashMap<String, BarSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, symbol: &str, series: BarSeries) -> Self {
        self.data.insert(symbol.to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        symbol: &str,
        _start_date: Option<NaiveDate>,
        _end_date: Option<NaiveDate>,
    ) -> Result<BarSeries, EngineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngineError::DataLoad {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| EngineError::DataLoad {
                reason: format!("no data for {symbol}"),
            })
    }
}

/// 300 bars: rises by 1 from 100 to 249, then falls by 1 back to 100.
pub fn trend_prices() -> Vec<f64> {
    (0..300)
        .map(|i| {
            if i < 150 {
                100.0 + i as f64
            } else {
                100.0 + (299 - i) as f64
            }
        })
        .collect()
}

pub fn trend_series() -> BarSeries {
    BarSeries::from_prices(&trend_prices()).unwrap()
}

/// `n` bars alternating 100, 101, 100, ...
pub fn alternating_series(n: usize) -> BarSeries {
    let prices: Vec<f64> = (0..n)
        .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
        .collect();
    BarSeries::from_prices(&prices).unwrap()
}

pub fn ramp_series(n: usize) -> BarSeries {
    let prices: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    BarSeries::from_prices(&prices).unwrap()
}

pub fn constant_series(n: usize, price: f64) -> BarSeries {
    BarSeries::from_prices(&vec![price; n]).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// `date,price` CSV with one row per day starting 2020-01-01.
pub fn prices_csv(prices: &[f64]) -> String {
    let start = date("2020-01-01");
    let mut out = String::from("date,price\n");
    for (i, p) in prices.iter().enumerate() {
        let d = start + chrono::Duration::days(i as i64);
        out.push_str(&format!("{},{}\n", d, p));
    }
    out
}

pub fn write_temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
