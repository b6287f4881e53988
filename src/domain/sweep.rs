//! Parameter sweeps over a single series.
//!
//! Each combination runs on its own `StrategyRunner` and therefore its own
//! ledger and trade log; runs share only the immutable series.

use log::{info, warn};
use rayon::prelude::*;

use super::bar::BarSeries;
use super::error::EngineError;
use super::policy::PositionPolicy;
use super::runner::{RunConfig, RunResult, StrategyRunner};
use super::signal::SignalRule;

/// Candidate values for each rule parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterGrid {
    pub fast: Vec<usize>,
    pub slow: Vec<usize>,
    pub window: Vec<usize>,
    pub threshold: Vec<f64>,
}

impl ParameterGrid {
    /// Expand the grid into concrete rules of kind `rule_name`.
    /// SMA combinations with `fast >= slow` are skipped.
    pub fn rules(&self, rule_name: &str) -> Result<Vec<SignalRule>, EngineError> {
        let non_empty = |name: &str, len: usize| -> Result<(), EngineError> {
            if len == 0 {
                return Err(EngineError::invalid_parameter(
                    name,
                    "sweep grid has no values",
                ));
            }
            Ok(())
        };

        let mut rules = Vec::new();
        match rule_name.trim().to_lowercase().replace('-', "_").as_str() {
            "sma" | "sma_crossover" => {
                non_empty("fast", self.fast.len())?;
                non_empty("slow", self.slow.len())?;
                for &fast in &self.fast {
                    for &slow in &self.slow {
                        if fast < slow {
                            rules.push(SignalRule::SmaCrossover { fast, slow });
                        }
                    }
                }
            }
            "momentum" => {
                non_empty("window", self.window.len())?;
                rules.extend(self.window.iter().map(|&window| SignalRule::Momentum { window }));
            }
            "mean_reversion" => {
                non_empty("window", self.window.len())?;
                non_empty("threshold", self.threshold.len())?;
                for &window in &self.window {
                    for &threshold in &self.threshold {
                        rules.push(SignalRule::MeanReversion { window, threshold });
                    }
                }
            }
            other => {
                return Err(EngineError::invalid_parameter(
                    "rule",
                    format!("unknown rule '{other}'"),
                ));
            }
        }
        Ok(rules)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SweepOutcome {
    /// Successful runs, best final cash first.
    pub results: Vec<RunResult>,
    pub failures: Vec<(SignalRule, EngineError)>,
}

pub fn run_sweep(
    series: &BarSeries,
    rules: &[SignalRule],
    policy: PositionPolicy,
    config: RunConfig,
) -> SweepOutcome {
    info!("sweeping {} parameter combinations", rules.len());

    let outcomes: Vec<(SignalRule, Result<RunResult, EngineError>)> = rules
        .par_iter()
        .map(|rule| {
            let runner = StrategyRunner::new(series, config);
            (*rule, runner.run(rule, policy))
        })
        .collect();

    let mut sweep = SweepOutcome::default();
    for (rule, outcome) in outcomes {
        match outcome {
            Ok(result) => sweep.results.push(result),
            Err(e) => {
                warn!("{} skipped: {}", rule, e);
                sweep.failures.push((rule, e));
            }
        }
    }
    sweep
        .results
        .sort_by(|a, b| b.final_cash.total_cmp(&a.final_cash));
    sweep
}
