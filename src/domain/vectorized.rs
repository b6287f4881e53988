//! Loop-free estimate of a signal rule's performance.
//!
//! The position held over bar `i` is the signal of bar `i - 1`; strategy
//! log-return is that position times the bar's log-return, less the
//! proportional cost on every bar where the position changes. There is no
//! ledger, no cash constraint and no fixed cost, so results are a quick
//! directional check on the event-driven runner rather than a replacement.

use super::bar::BarSeries;
use super::error::EngineError;
use super::signal::SignalRule;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorizedResult {
    pub strategy_value: f64,
    pub buy_and_hold_value: f64,
    pub outperformance: f64,
    pub position_changes: usize,
}

pub fn backtest(
    series: &BarSeries,
    rule: &SignalRule,
    proportional_cost: f64,
    amount: f64,
) -> Result<VectorizedResult, EngineError> {
    if let SignalRule::MeanReversion { .. } = rule {
        return Err(EngineError::invalid_parameter(
            "rule",
            "mean reversion depends on the held position and has no vectorized form",
        ));
    }
    if !proportional_cost.is_finite() || proportional_cost < 0.0 {
        return Err(EngineError::invalid_parameter(
            "proportional_cost",
            "must be non-negative",
        ));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EngineError::invalid_parameter("amount", "must be positive"));
    }

    let prepared = rule.prepare(series)?;
    let signals = prepared.signals();

    let mut strategy_log = 0.0_f64;
    let mut market_log = 0.0_f64;
    let mut position_changes = 0usize;

    for (i, bar) in series.bars().iter().enumerate().skip(1) {
        let ret = match bar.ret {
            Some(r) if r.is_finite() => r,
            _ => {
                return Err(EngineError::InsufficientData {
                    bars: i,
                    required: series.len(),
                });
            }
        };
        let held = signals[i - 1].value() as f64;
        market_log += ret;
        strategy_log += held * ret;

        if signals[i] != signals[i - 1] {
            strategy_log -= proportional_cost;
            position_changes += 1;
        }
    }

    let strategy_value = amount * strategy_log.exp();
    let buy_and_hold_value = amount * market_log.exp();

    Ok(VectorizedResult {
        strategy_value,
        buy_and_hold_value,
        outperformance: strategy_value - buy_and_hold_value,
        position_changes,
    })
}
