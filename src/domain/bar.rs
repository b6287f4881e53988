//! Price bars and the immutable bar series a run is driven over.

use chrono::NaiveDate;

use super::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub price: f64,
    /// ln(price / previous price); `None` on the first bar.
    pub ret: Option<f64>,
}

/// Ordered, validated sequence of bars for a single instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Wrap caller-supplied bars. Indices must be strictly increasing and
    /// prices finite and positive; returns are taken as given.
    pub fn new(bars: Vec<Bar>) -> Result<Self, EngineError> {
        for (i, bar) in bars.iter().enumerate() {
            if !bar.price.is_finite() || bar.price <= 0.0 {
                return Err(EngineError::InvalidSeries {
                    reason: format!("bar {} has invalid price {}", bar.index, bar.price),
                });
            }
            if i > 0 && bar.index <= bars[i - 1].index {
                return Err(EngineError::InvalidSeries {
                    reason: format!(
                        "bar index {} does not follow {}",
                        bar.index,
                        bars[i - 1].index
                    ),
                });
            }
        }
        Ok(Self { bars })
    }

    /// Build a series from raw prices, deriving log-returns.
    pub fn from_prices(prices: &[f64]) -> Result<Self, EngineError> {
        Self::from_dated_prices(prices.iter().map(|&p| (None, p)))
    }

    pub fn from_dated_prices<I>(rows: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (Option<NaiveDate>, f64)>,
    {
        let mut bars: Vec<Bar> = Vec::new();
        for (index, (date, price)) in rows.into_iter().enumerate() {
            let ret = bars.last().map(|prev| (price / prev.price).ln());
            bars.push(Bar {
                index,
                date,
                price,
                ret,
            });
        }
        Self::new(bars)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.price).collect()
    }

    /// price[last] / price[first] - 1, or 0 for an empty series.
    pub fn buy_and_hold_return(&self) -> f64 {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => last.price / first.price - 1.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(index: usize, price: f64) -> Bar {
        Bar {
            index,
            date: None,
            price,
            ret: None,
        }
    }

    #[test]
    fn from_prices_derives_log_returns() {
        let series = BarSeries::from_prices(&[100.0, 110.0, 99.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.bars()[0].ret.is_none());
        let r1 = series.bars()[1].ret.unwrap();
        assert!((r1 - (110.0f64 / 100.0).ln()).abs() < 1e-12);
        let r2 = series.bars()[2].ret.unwrap();
        assert!((r2 - (99.0f64 / 110.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn indices_assigned_in_order() {
        let series = BarSeries::from_prices(&[1.0, 2.0, 3.0]).unwrap();
        let indices: Vec<usize> = series.bars().iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_reordered_indices() {
        let result = BarSeries::new(vec![bar(0, 1.0), bar(2, 1.0), bar(1, 1.0)]);
        assert!(matches!(result, Err(EngineError::InvalidSeries { .. })));
    }

    #[test]
    fn rejects_duplicate_indices() {
        let result = BarSeries::new(vec![bar(3, 1.0), bar(3, 1.0)]);
        assert!(matches!(result, Err(EngineError::InvalidSeries { .. })));
    }

    #[test]
    fn allows_gaps_in_indices() {
        let series = BarSeries::new(vec![bar(0, 1.0), bar(5, 2.0), bar(9, 3.0)]).unwrap();
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn rejects_non_positive_price() {
        assert!(BarSeries::from_prices(&[10.0, 0.0]).is_err());
        assert!(BarSeries::from_prices(&[10.0, -1.0]).is_err());
        assert!(BarSeries::from_prices(&[f64::NAN]).is_err());
    }

    #[test]
    fn buy_and_hold_over_whole_series() {
        let series = BarSeries::from_prices(&[100.0, 80.0, 125.0]).unwrap();
        assert!((series.buy_and_hold_return() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_series() {
        let series = BarSeries::from_prices(&[]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.buy_and_hold_return(), 0.0);
    }
}
