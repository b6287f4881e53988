//! Simple Moving Average over bar prices.
//!
//! SMA(n)[i] = sum(P[i-j] for j in 0..n) / n
//! Warmup: first (n-1) bars are invalid.

use crate::domain::bar::BarSeries;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_sma(series: &BarSeries, period: usize) -> IndicatorSeries {
    let bars = series.bars();
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let valid = period > 0 && i + 1 >= period;

        let value = if valid {
            let window = &bars[i + 1 - period..=i];
            window.iter().map(|b| b.price).sum::<f64>() / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            index: bars[i].index,
            valid,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let series = BarSeries::from_prices(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        let sma = calculate_sma(&series, 3);

        assert!(!sma.values[0].valid);
        assert!(!sma.values[1].valid);
        assert!(sma.values[2].valid);
        assert!(sma.values[3].valid);
    }

    #[test]
    fn sma_values() {
        let series = BarSeries::from_prices(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        let sma = calculate_sma(&series, 3);
        assert!((sma.values[2].value - 20.0).abs() < 1e-12);
        assert!((sma.values[3].value - 30.0).abs() < 1e-12);
    }

    #[test]
    fn sma_period_one_is_price() {
        let series = BarSeries::from_prices(&[5.0, 7.0]).unwrap();
        let sma = calculate_sma(&series, 1);
        assert_eq!(sma.value_at(0), Some(5.0));
        assert_eq!(sma.value_at(1), Some(7.0));
    }

    #[test]
    fn sma_constant_prices_exact() {
        let series = BarSeries::from_prices(&[50.0; 30]).unwrap();
        let sma = calculate_sma(&series, 20);
        assert_eq!(sma.value_at(29), Some(50.0));
    }

    #[test]
    fn sma_period_zero_never_valid() {
        let series = BarSeries::from_prices(&[1.0, 2.0]).unwrap();
        let sma = calculate_sma(&series, 0);
        assert!(sma.values.iter().all(|p| !p.valid));
    }
}
