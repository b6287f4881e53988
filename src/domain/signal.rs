//! Trading rules and their per-bar signals.
//!
//! A [`SignalRule`] is validated against a series and then prepared into a
//! [`PreparedRule`]: a single pre-pass of rolling statistics over the whole
//! series. The runner only ever asks the prepared rule for a target
//! position at a bar.

use std::fmt;

use super::bar::BarSeries;
use super::error::EngineError;
use super::indicator::momentum::calculate_momentum;
use super::indicator::sma::calculate_sma;
use super::indicator::IndicatorSeries;
use super::policy::PositionPolicy;
use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    Long,
    Short,
    #[default]
    Flat,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Short => -1,
            Signal::Flat => 0,
        }
    }

    pub fn from_sign(x: f64) -> Self {
        if x > 0.0 {
            Signal::Long
        } else if x < 0.0 {
            Signal::Short
        } else {
            Signal::Flat
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalRule {
    SmaCrossover { fast: usize, slow: usize },
    Momentum { window: usize },
    MeanReversion { window: usize, threshold: f64 },
}

/// Loosely typed rule parameters as they arrive from config or a CLI.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RuleParams {
    pub fast: Option<usize>,
    pub slow: Option<usize>,
    pub window: Option<usize>,
    pub threshold: Option<f64>,
}

fn required<T>(value: Option<T>, name: &str, rule: &str) -> Result<T, EngineError> {
    value.ok_or_else(|| EngineError::invalid_parameter(name, format!("required for {rule} rule")))
}

impl SignalRule {
    pub const NAMES: [&'static str; 3] = ["sma", "momentum", "mean_reversion"];

    pub fn from_name(name: &str, params: &RuleParams) -> Result<Self, EngineError> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "sma" | "sma_crossover" => Ok(SignalRule::SmaCrossover {
                fast: required(params.fast, "fast", "sma")?,
                slow: required(params.slow, "slow", "sma")?,
            }),
            "momentum" => Ok(SignalRule::Momentum {
                window: required(params.window, "window", "momentum")?,
            }),
            "mean_reversion" => Ok(SignalRule::MeanReversion {
                window: required(params.window, "window", "mean_reversion")?,
                threshold: required(params.threshold, "threshold", "mean_reversion")?,
            }),
            other => Err(EngineError::invalid_parameter(
                "rule",
                format!(
                    "unknown rule '{other}' (expected one of {})",
                    Self::NAMES.join(", ")
                ),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalRule::SmaCrossover { .. } => "sma",
            SignalRule::Momentum { .. } => "momentum",
            SignalRule::MeanReversion { .. } => "mean_reversion",
        }
    }

    /// First bar position at which the rule is evaluated.
    pub fn warmup(&self) -> usize {
        match *self {
            SignalRule::SmaCrossover { fast, slow } => fast.max(slow),
            SignalRule::Momentum { window } => window,
            SignalRule::MeanReversion { window, .. } => window,
        }
    }

    /// Momentum treats a non-positive mean return as an exit for long-only runs.
    fn exits_on_flat(&self) -> bool {
        matches!(self, SignalRule::Momentum { .. })
    }

    pub fn validate(&self, bars: usize) -> Result<(), EngineError> {
        if bars == 0 {
            return Err(EngineError::InsufficientData {
                bars,
                required: self.warmup() + 1,
            });
        }

        let check_window = |name: &str, window: usize| -> Result<(), EngineError> {
            if window == 0 {
                return Err(EngineError::invalid_parameter(name, "must be at least 1"));
            }
            if window >= bars {
                return Err(EngineError::invalid_parameter(
                    name,
                    format!("{window} must be less than series length {bars}"),
                ));
            }
            Ok(())
        };

        match *self {
            SignalRule::SmaCrossover { fast, slow } => {
                check_window("fast", fast)?;
                check_window("slow", slow)?;
            }
            SignalRule::Momentum { window } => check_window("window", window)?,
            SignalRule::MeanReversion { window, threshold } => {
                check_window("window", window)?;
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(EngineError::invalid_parameter(
                        "threshold",
                        format!("must be a non-negative number, got {threshold}"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Validate and compute the rule's rolling statistics over `series`.
    pub fn prepare(&self, series: &BarSeries) -> Result<PreparedRule, EngineError> {
        self.validate(series.len())?;
        let warmup = self.warmup();

        let (signals, mean) = match *self {
            SignalRule::SmaCrossover { fast, slow } => {
                let fast_sma = calculate_sma(series, fast);
                let slow_sma = calculate_sma(series, slow);
                let signals = (0..series.len())
                    .map(|i| match (fast_sma.value_at(i), slow_sma.value_at(i)) {
                        (Some(f), Some(s)) if i >= warmup => Signal::from_sign(f - s),
                        _ => Signal::Flat,
                    })
                    .collect();
                (signals, None)
            }
            SignalRule::Momentum { window } => {
                let momentum = calculate_momentum(series, window);
                let mut signals = Vec::with_capacity(series.len());
                for i in 0..series.len() {
                    if i < warmup {
                        signals.push(Signal::Flat);
                        continue;
                    }
                    match momentum.value_at(i) {
                        Some(m) if m.is_finite() => signals.push(Signal::from_sign(m)),
                        _ => {
                            return Err(EngineError::InsufficientData {
                                bars: i,
                                required: series.len(),
                            });
                        }
                    }
                }
                (signals, None)
            }
            SignalRule::MeanReversion { window, threshold } => {
                let sma = calculate_sma(series, window);
                let signals = series
                    .bars()
                    .iter()
                    .enumerate()
                    .map(|(i, bar)| match sma.value_at(i) {
                        Some(m) if i >= warmup && bar.price < m - threshold => Signal::Long,
                        Some(m) if i >= warmup && bar.price > m + threshold => Signal::Short,
                        _ => Signal::Flat,
                    })
                    .collect();
                (signals, Some(sma))
            }
        };

        Ok(PreparedRule {
            rule: *self,
            signals,
            mean,
        })
    }
}

impl fmt::Display for SignalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalRule::SmaCrossover { fast, slow } => write!(f, "SMA({},{})", fast, slow),
            SignalRule::Momentum { window } => write!(f, "MOMENTUM({})", window),
            SignalRule::MeanReversion { window, threshold } => {
                write!(f, "MEAN_REVERSION({},{})", window, threshold)
            }
        }
    }
}

/// A rule with its rolling statistics computed for one series.
#[derive(Debug, Clone)]
pub struct PreparedRule {
    rule: SignalRule,
    signals: Vec<Signal>,
    mean: Option<IndicatorSeries>,
}

impl PreparedRule {
    pub fn rule(&self) -> &SignalRule {
        &self.rule
    }

    /// One signal per bar. For mean reversion this is the band signal
    /// (+1 below the lower band, -1 above the upper band).
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn signal_at(&self, i: usize) -> Signal {
        self.signals.get(i).copied().unwrap_or_default()
    }

    /// Target position at series position `i`, or `None` to hold.
    pub fn target(
        &self,
        i: usize,
        price: f64,
        position: Position,
        policy: PositionPolicy,
    ) -> Option<Position> {
        if i < self.rule.warmup() {
            return None;
        }
        match (self.rule, &self.mean) {
            (SignalRule::MeanReversion { threshold, .. }, Some(mean)) => {
                let m = mean.value_at(i)?;
                policy.band_transition(position, price, m, threshold)
            }
            _ => policy.signal_transition(position, self.signal_at(i), self.rule.exits_on_flat()),
        }
    }
}
