//! Cash and unit ledger for a single-instrument run.

use super::position::Position;

/// Transaction costs charged on every filled order:
/// `fixed + proportional * notional`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostModel {
    pub fixed: f64,
    pub proportional: f64,
}

impl CostModel {
    pub fn new(fixed: f64, proportional: f64) -> Self {
        CostModel {
            fixed,
            proportional,
        }
    }

    pub fn frictionless() -> Self {
        CostModel::default()
    }

    pub fn commission(&self, notional: f64) -> f64 {
        self.fixed + self.proportional * notional
    }

    pub fn is_frictionless(&self) -> bool {
        self.fixed == 0.0 && self.proportional == 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash: f64,
    pub units: f64,
    pub initial_cash: f64,
    pub costs: CostModel,
}

impl Ledger {
    pub fn new(initial_cash: f64, costs: CostModel) -> Self {
        Ledger {
            cash: initial_cash,
            units: 0.0,
            initial_cash,
            costs,
        }
    }

    pub fn position(&self) -> Position {
        Position::from_units(self.units)
    }

    /// Debit `units * price` plus costs and add the units. Returns the cost charged.
    pub fn apply_buy(&mut self, units: f64, price: f64) -> f64 {
        let notional = units * price;
        let cost = self.costs.commission(notional);
        self.cash -= notional + cost;
        self.units += units;
        cost
    }

    /// Credit `units * price` minus costs and remove the units. Returns the cost charged.
    pub fn apply_sell(&mut self, units: f64, price: f64) -> f64 {
        let notional = units * price;
        let cost = self.costs.commission(notional);
        self.cash += notional - cost;
        self.units -= units;
        cost
    }

    pub fn net_wealth(&self, price: f64) -> f64 {
        self.cash + self.units * price
    }
}
