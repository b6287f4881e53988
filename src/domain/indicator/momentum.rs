//! Momentum: rolling mean of log-returns.
//!
//! MOM(n)[i] = sum(R[i-j] for j in 0..n) / n
//! A point is valid only when every return in its window is present, so
//! with the first bar carrying no return the first valid bar is `n`.

use crate::domain::bar::BarSeries;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_momentum(series: &BarSeries, period: usize) -> IndicatorSeries {
    let bars = series.bars();
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let window_sum = if period > 0 && i + 1 >= period {
            bars[i + 1 - period..=i]
                .iter()
                .map(|b| b.ret)
                .sum::<Option<f64>>()
        } else {
            None
        };

        values.push(IndicatorPoint {
            index: bars[i].index,
            valid: window_sum.is_some(),
            value: window_sum.map_or(0.0, |s| s / period as f64),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Momentum(period),
        values,
    }
}
