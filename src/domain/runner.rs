//! Bar-by-bar strategy runner.
//!
//! One loop serves every rule and both position policies: the prepared rule
//! names a target position, the runner turns the transition into orders,
//! and the final bar always closes out.

use chrono::NaiveDate;
use log::{info, warn};

use super::bar::{Bar, BarSeries};
use super::error::EngineError;
use super::execution::{OrderExecutor, TradeRecord};
use super::ledger::CostModel;
use super::policy::PositionPolicy;
use super::position::Position;
use super::signal::{RuleParams, SignalRule};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    pub starting_cash: f64,
    pub costs: CostModel,
}

impl RunConfig {
    pub fn new(starting_cash: f64, fixed_cost: f64, proportional_cost: f64) -> Self {
        RunConfig {
            starting_cash,
            costs: CostModel::new(fixed_cost, proportional_cost),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.starting_cash.is_finite() || self.starting_cash <= 0.0 {
            return Err(EngineError::invalid_parameter(
                "starting_cash",
                format!("must be positive, got {}", self.starting_cash),
            ));
        }
        if !self.costs.fixed.is_finite() || self.costs.fixed < 0.0 {
            return Err(EngineError::invalid_parameter(
                "fixed_cost",
                "must be non-negative",
            ));
        }
        if !self.costs.proportional.is_finite() || self.costs.proportional < 0.0 {
            return Err(EngineError::invalid_parameter(
                "proportional_cost",
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub bar_index: usize,
    pub date: Option<NaiveDate>,
    pub cash: f64,
    pub units: f64,
    pub equity: f64,
}

/// An order the runner attempted and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedOrder {
    pub bar_index: usize,
    pub error: EngineError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub rule: SignalRule,
    pub policy: PositionPolicy,
    pub starting_cash: f64,
    pub final_cash: f64,
    pub absolute_performance: f64,
    pub buy_and_hold_performance: f64,
    pub excess_performance: f64,
    pub total_costs: f64,
    pub trade_log: Vec<TradeRecord>,
    /// Position after each bar; the last entry is after close-out.
    pub positions: Vec<Position>,
    pub equity_curve: Vec<EquityPoint>,
    pub rejected_orders: Vec<RejectedOrder>,
}

impl RunResult {
    pub fn trade_count(&self) -> usize {
        self.trade_log.len()
    }
}

pub struct StrategyRunner<'a> {
    series: &'a BarSeries,
    config: RunConfig,
}

impl<'a> StrategyRunner<'a> {
    pub fn new(series: &'a BarSeries, config: RunConfig) -> Self {
        StrategyRunner { series, config }
    }

    /// Run `rule` under `policy` from a fresh ledger.
    ///
    /// Parameter errors abort before the first bar. Orders rejected inside
    /// the loop are logged, recorded in `rejected_orders`, and skipped.
    pub fn run(&self, rule: &SignalRule, policy: PositionPolicy) -> Result<RunResult, EngineError> {
        self.config.validate()?;
        let prepared = rule.prepare(self.series)?;
        let bars = self.series.bars();
        let last = match bars.last() {
            Some(l) => l,
            None => {
                return Err(EngineError::InsufficientData {
                    bars: 0,
                    required: rule.warmup() + 1,
                });
            }
        };

        info!(
            "running {} | policy {} | fixed costs {:.2} | proportional costs {:.4}",
            rule, policy, self.config.costs.fixed, self.config.costs.proportional
        );

        let mut executor = OrderExecutor::new(self.config.starting_cash, self.config.costs);
        let mut positions = Vec::with_capacity(bars.len());
        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut rejected_orders = Vec::new();

        for (i, bar) in bars.iter().enumerate() {
            let current = executor.position();
            if let Some(target) = prepared.target(i, bar.price, current, policy) {
                if let Err(error) = transition(&mut executor, bar, current, target) {
                    warn!(
                        "bar {}: {} -> {} dropped: {}",
                        bar.index, current, target, error
                    );
                    rejected_orders.push(RejectedOrder {
                        bar_index: bar.index,
                        error,
                    });
                }
            }
            positions.push(executor.position());
            equity_curve.push(equity_point(&executor, bar));
        }

        let report = executor.close_out(last, self.series.buy_and_hold_return())?;
        if let Some(p) = positions.last_mut() {
            *p = executor.position();
        }
        if let Some(point) = equity_curve.last_mut() {
            *point = equity_point(&executor, last);
        }

        info!(
            "final balance {:.2} | net performance {:.2}% | buy-and-hold {:.2}% | trades {}",
            report.final_cash,
            report.absolute_performance * 100.0,
            report.buy_and_hold_performance * 100.0,
            report.trade_count
        );

        Ok(RunResult {
            rule: *rule,
            policy,
            starting_cash: self.config.starting_cash,
            final_cash: report.final_cash,
            absolute_performance: report.absolute_performance,
            buy_and_hold_performance: report.buy_and_hold_performance,
            excess_performance: report.excess_performance,
            total_costs: report.total_costs,
            trade_log: executor.into_trades(),
            positions,
            equity_curve,
            rejected_orders,
        })
    }
}

/// Resolve a rule by name and run it over `series`.
pub fn run(
    series: &BarSeries,
    rule_name: &str,
    rule_params: &RuleParams,
    policy: PositionPolicy,
    starting_cash: f64,
    fixed_cost: f64,
    proportional_cost: f64,
) -> Result<RunResult, EngineError> {
    let rule = SignalRule::from_name(rule_name, rule_params)?;
    let config = RunConfig::new(starting_cash, fixed_cost, proportional_cost);
    StrategyRunner::new(series, config).run(&rule, policy)
}

fn equity_point(executor: &OrderExecutor, bar: &Bar) -> EquityPoint {
    let ledger = executor.ledger();
    EquityPoint {
        bar_index: bar.index,
        date: bar.date,
        cash: ledger.cash,
        units: ledger.units,
        equity: ledger.net_wealth(bar.price),
    }
}

/// Turn a position change into orders. Entries use all cash on hand at the
/// bar, not the starting capital; a direct flip first unwinds the open side.
fn transition(
    executor: &mut OrderExecutor,
    bar: &Bar,
    from: Position,
    to: Position,
) -> Result<(), EngineError> {
    match (from, to) {
        (Position::Long, Position::Neutral | Position::Short) => {
            let units = executor.ledger().units;
            executor.sell(bar, Some(units), None)?;
        }
        (Position::Short, Position::Neutral | Position::Long) => {
            let units = -executor.ledger().units;
            executor.buy(bar, Some(units), None)?;
        }
        _ => {}
    }

    match (from, to) {
        (Position::Neutral | Position::Short, Position::Long) => {
            let cash = executor.ledger().cash;
            executor.buy(bar, None, Some(cash))?;
        }
        (Position::Neutral | Position::Long, Position::Short) => {
            let cash = executor.ledger().cash;
            executor.sell(bar, None, Some(cash))?;
        }
        _ => {}
    }
    Ok(())
}
