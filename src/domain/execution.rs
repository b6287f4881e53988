//! Order execution against the ledger.
//!
//! Every filled order pays the ledger's cost model and appends one
//! immutable [`TradeRecord`] to the executor's log. Orders are sized either
//! in units or as a cash amount converted at the bar's price.

use chrono::NaiveDate;
use log::debug;
use std::fmt;

use super::bar::Bar;
use super::error::EngineError;
use super::ledger::{CostModel, Ledger};
use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeReason {
    Signal,
    CloseOut,
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeReason::Signal => write!(f, "signal"),
            TradeReason::CloseOut => write!(f, "close_out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub bar_index: usize,
    pub date: Option<NaiveDate>,
    pub side: Side,
    pub units: f64,
    pub price: f64,
    pub cost: f64,
    pub cash_after: f64,
    pub reason: TradeReason,
}

impl TradeRecord {
    pub fn notional(&self) -> f64 {
        self.units * self.price
    }
}

/// Outcome of the terminal close-out of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseOutReport {
    pub bar_index: usize,
    pub final_cash: f64,
    pub absolute_performance: f64,
    pub buy_and_hold_performance: f64,
    pub excess_performance: f64,
    pub total_costs: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone)]
pub struct OrderExecutor {
    ledger: Ledger,
    trades: Vec<TradeRecord>,
}

impl OrderExecutor {
    pub fn new(initial_cash: f64, costs: CostModel) -> Self {
        OrderExecutor {
            ledger: Ledger::new(initial_cash, costs),
            trades: Vec::new(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn position(&self) -> Position {
        self.ledger.position()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }

    pub fn total_costs(&self) -> f64 {
        self.trades.iter().map(|t| t.cost).sum()
    }

    /// Buy either `units` or as many units as `amount` of cash buys at the
    /// bar's price. Exactly one of the two must be given.
    pub fn buy(
        &mut self,
        bar: &Bar,
        units: Option<f64>,
        amount: Option<f64>,
    ) -> Result<&TradeRecord, EngineError> {
        self.place_order(Side::Buy, bar, units, amount, TradeReason::Signal)
    }

    /// Sell either `units` or the units worth `amount` of cash at the bar's
    /// price. Selling past zero opens a short.
    pub fn sell(
        &mut self,
        bar: &Bar,
        units: Option<f64>,
        amount: Option<f64>,
    ) -> Result<&TradeRecord, EngineError> {
        self.place_order(Side::Sell, bar, units, amount, TradeReason::Signal)
    }

    /// Flatten any open position at `bar` and report the run's outcome
    /// against the series' buy-and-hold return.
    pub fn close_out(
        &mut self,
        bar: &Bar,
        buy_and_hold_performance: f64,
    ) -> Result<CloseOutReport, EngineError> {
        let units = self.ledger.units;
        if units > 0.0 {
            self.place_order(Side::Sell, bar, Some(units), None, TradeReason::CloseOut)?;
        } else if units < 0.0 {
            self.place_order(Side::Buy, bar, Some(-units), None, TradeReason::CloseOut)?;
        }

        let initial = self.ledger.initial_cash;
        let final_cash = self.ledger.cash;
        let absolute_performance = (final_cash - initial) / initial;

        Ok(CloseOutReport {
            bar_index: bar.index,
            final_cash,
            absolute_performance,
            buy_and_hold_performance,
            excess_performance: absolute_performance - buy_and_hold_performance,
            total_costs: self.total_costs(),
            trade_count: self.trades.len(),
        })
    }

    fn place_order(
        &mut self,
        side: Side,
        bar: &Bar,
        units: Option<f64>,
        amount: Option<f64>,
        reason: TradeReason,
    ) -> Result<&TradeRecord, EngineError> {
        let units = resolve_units(units, amount, bar.price)?;

        let cost = match side {
            Side::Buy => self.ledger.apply_buy(units, bar.price),
            Side::Sell => self.ledger.apply_sell(units, bar.price),
        };

        let trade = TradeRecord {
            bar_index: bar.index,
            date: bar.date,
            side,
            units,
            price: bar.price,
            cost,
            cash_after: self.ledger.cash,
            reason,
        };
        debug!(
            "bar {} | {} {:.4} units at {:.4} | notional {:.2} | cost {:.2} | cash {:.2} | net wealth {:.2}",
            bar.index,
            side,
            units,
            bar.price,
            trade.notional(),
            cost,
            self.ledger.cash,
            self.ledger.net_wealth(bar.price),
        );

        self.trades.push(trade);
        Ok(&self.trades[self.trades.len() - 1])
    }
}

fn resolve_units(units: Option<f64>, amount: Option<f64>, price: f64) -> Result<f64, EngineError> {
    let units = match (units, amount) {
        (Some(u), None) => u,
        (None, Some(a)) => {
            if !a.is_finite() || a <= 0.0 {
                return Err(EngineError::invalid_order(format!(
                    "amount must be positive, got {a}"
                )));
            }
            a / price
        }
        (Some(_), Some(_)) => {
            return Err(EngineError::invalid_order(
                "give either units or amount, not both",
            ));
        }
        (None, None) => {
            return Err(EngineError::invalid_order("units or amount is required"));
        }
    };

    if !units.is_finite() || units <= 0.0 {
        return Err(EngineError::invalid_order(format!(
            "units must be positive, got {units}"
        )));
    }
    Ok(units)
}
