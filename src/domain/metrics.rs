//! Performance metrics derived from a finished run.

use super::position::Position;
use super::runner::{EquityPoint, RunResult};

const BARS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub trade_count: usize,
    pub round_trips: usize,
    pub total_costs: f64,
    /// Fraction of bars spent holding a position.
    pub exposure: f64,
}

impl Metrics {
    pub fn compute(result: &RunResult, risk_free_rate: f64) -> Self {
        let equity_curve = &result.equity_curve;
        let initial_capital = result.starting_cash;

        let total_return = if initial_capital > 0.0 {
            (result.final_cash - initial_capital) / initial_capital
        } else {
            0.0
        };

        let years = equity_curve.len() as f64 / BARS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 && total_return.is_finite() {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let per_bar_rf = risk_free_rate / BARS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, per_bar_rf);

        let mut round_trips = 0usize;
        let mut prev = Position::Neutral;
        for &pos in &result.positions {
            if prev != Position::Neutral && pos != prev {
                round_trips += 1;
            }
            prev = pos;
        }

        let exposure = if result.positions.is_empty() {
            0.0
        } else {
            let held = result
                .positions
                .iter()
                .filter(|&&p| p != Position::Neutral)
                .count();
            held as f64 / result.positions.len() as f64
        };

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            trade_count: result.trade_log.len(),
            round_trips,
            total_costs: result.total_costs,
            exposure,
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    if equity_curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], per_bar_rf: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - per_bar_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * BARS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < per_bar_rf)
        .map(|&r| (r - per_bar_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * BARS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
