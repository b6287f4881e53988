//! Rolling-window indicators over a bar series.
//!
//! - `IndicatorPoint`: one value per bar, flagged invalid during warm-up
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a full pass over the series

pub mod momentum;
pub mod sma;

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub index: usize,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Momentum(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at series position `i`, if past warm-up.
    pub fn value_at(&self, i: usize) -> Option<f64> {
        self.values
            .get(i)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Momentum(period) => write!(f, "MOMENTUM({})", period),
        }
    }
}
