//! Position policies and their transition tables.
//!
//! Two families of transitions exist. Signal-driven rules (SMA crossover,
//! momentum) map `(policy, position, signal)` to a target position and flip
//! directly between Long and Short under the long-short policy. Band-driven
//! mean reversion maps `(policy, position, price vs. band)` to a target and
//! always passes through Neutral.

use std::fmt;
use std::str::FromStr;

use super::error::EngineError;
use super::position::Position;
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PositionPolicy {
    #[default]
    LongOnly,
    LongShort,
}

impl PositionPolicy {
    pub fn allows_short(self) -> bool {
        self == PositionPolicy::LongShort
    }

    /// Target position for a precomputed signal, or `None` to hold.
    ///
    /// `exit_on_flat` makes a Flat signal close a long under the long-only
    /// policy (momentum treats a zero mean return as an exit).
    pub fn signal_transition(
        self,
        position: Position,
        signal: Signal,
        exit_on_flat: bool,
    ) -> Option<Position> {
        use Position::{Long, Neutral, Short};

        match (self, position, signal) {
            (PositionPolicy::LongOnly, Neutral, Signal::Long) => Some(Long),
            (PositionPolicy::LongOnly, Long, Signal::Short) => Some(Neutral),
            (PositionPolicy::LongOnly, Long, Signal::Flat) if exit_on_flat => Some(Neutral),

            (PositionPolicy::LongShort, Neutral | Short, Signal::Long) => Some(Long),
            (PositionPolicy::LongShort, Neutral | Long, Signal::Short) => Some(Short),

            _ => None,
        }
    }

    /// Target position for mean reversion around `mean` with an absolute
    /// `threshold` band, or `None` to hold.
    pub fn band_transition(
        self,
        position: Position,
        price: f64,
        mean: f64,
        threshold: f64,
    ) -> Option<Position> {
        match position {
            Position::Neutral if price < mean - threshold => Some(Position::Long),
            Position::Neutral if self.allows_short() && price > mean + threshold => {
                Some(Position::Short)
            }
            Position::Long if price >= mean => Some(Position::Neutral),
            Position::Short if price <= mean => Some(Position::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for PositionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionPolicy::LongOnly => write!(f, "long_only"),
            PositionPolicy::LongShort => write!(f, "long_short"),
        }
    }
}

impl FromStr for PositionPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "long_only" | "long" => Ok(PositionPolicy::LongOnly),
            "long_short" => Ok(PositionPolicy::LongShort),
            other => Err(EngineError::invalid_parameter(
                "policy",
                format!("unknown policy '{other}' (expected long_only or long_short)"),
            )),
        }
    }
}
