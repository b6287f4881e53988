//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::bar::BarSeries;
use crate::domain::config_validation::{
    parse_optional_date, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::EngineError;
use crate::domain::metrics::Metrics;
use crate::domain::policy::PositionPolicy;
use crate::domain::runner::{RunConfig, RunResult, StrategyRunner};
use crate::domain::signal::{RuleParams, SignalRule};
use crate::domain::sweep::{run_sweep, ParameterGrid};
use crate::domain::vectorized;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "eventbt", about = "Event-driven signal backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy over a price series
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [backtest] data_path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// long_only or long_short; overrides [backtest] policy
        #[arg(short, long)]
        policy: Option<String>,
        /// Write <stem>_trades.csv and <stem>_equity.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run every parameter combination in [sweep] and rank by final cash
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Loop-free estimate of the configured rule
    Vectorized {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            data,
            policy,
            output,
        } => run_backtest(&config, data.as_deref(), policy.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Sweep {
            config,
            data,
            top,
            output,
        } => run_parameter_sweep(&config, data.as_deref(), top, output.as_deref()),
        Command::Vectorized { config, data } => run_vectorized(&config, data.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EngineError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| EngineError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_validated(path: &Path) -> Result<FileConfigAdapter, EngineError> {
    let adapter = load_config(path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    Ok(adapter)
}

pub fn build_run_config(adapter: &dyn ConfigPort) -> Result<RunConfig, EngineError> {
    let config = RunConfig::new(
        adapter.get_double("backtest", "initial_capital", 10_000.0),
        adapter.get_double("backtest", "fixed_cost", 0.0),
        adapter.get_double("backtest", "proportional_cost", 0.0),
    );
    config.validate()?;
    Ok(config)
}

pub fn build_policy(
    adapter: &dyn ConfigPort,
    policy_override: Option<&str>,
) -> Result<PositionPolicy, EngineError> {
    match policy_override {
        Some(p) => p
            .parse()
            .map_err(|_| EngineError::invalid_parameter("policy", format!("unknown policy '{p}'"))),
        None => match adapter.get_string("backtest", "policy") {
            None => Ok(PositionPolicy::default()),
            Some(p) => p.parse().map_err(|_| EngineError::ConfigInvalid {
                section: "backtest".into(),
                key: "policy".into(),
                reason: format!("unknown policy '{p}'"),
            }),
        },
    }
}

fn positive_usize(adapter: &dyn ConfigPort, key: &str) -> Option<usize> {
    let value = adapter.get_int("strategy", key, 0);
    (value > 0).then_some(value as usize)
}

pub fn build_rule_params(adapter: &dyn ConfigPort) -> RuleParams {
    RuleParams {
        fast: positive_usize(adapter, "fast"),
        slow: positive_usize(adapter, "slow"),
        window: positive_usize(adapter, "window"),
        threshold: adapter
            .get_string("strategy", "threshold")
            .and_then(|s| s.trim().parse().ok()),
    }
}

pub fn build_rule(adapter: &dyn ConfigPort) -> Result<SignalRule, EngineError> {
    let name = adapter
        .get_string("strategy", "rule")
        .ok_or_else(|| EngineError::ConfigMissing {
            section: "strategy".into(),
            key: "rule".into(),
        })?;
    SignalRule::from_name(&name, &build_rule_params(adapter))
}

fn parse_grid<T: std::str::FromStr>(
    adapter: &dyn ConfigPort,
    key: &str,
    fallback: Option<T>,
) -> Result<Vec<T>, EngineError> {
    match adapter.get_list("sweep", key) {
        Some(entries) => entries
            .iter()
            .map(|s| {
                s.parse::<T>().map_err(|_| EngineError::ConfigInvalid {
                    section: "sweep".into(),
                    key: key.into(),
                    reason: format!("invalid entry '{s}'"),
                })
            })
            .collect(),
        None => Ok(fallback.into_iter().collect()),
    }
}

/// Read `[sweep]` grids; a key without a grid falls back to its `[strategy]` value.
pub fn build_grid(adapter: &dyn ConfigPort) -> Result<ParameterGrid, EngineError> {
    let params = build_rule_params(adapter);
    Ok(ParameterGrid {
        fast: parse_grid(adapter, "fast", params.fast)?,
        slow: parse_grid(adapter, "slow", params.slow)?,
        window: parse_grid(adapter, "window", params.window)?,
        threshold: parse_grid(adapter, "threshold", params.threshold)?,
    })
}

/// Load the configured symbol from `data_override` or `[backtest] data_path`.
pub fn load_series(
    adapter: &dyn ConfigPort,
    data_override: Option<&Path>,
) -> Result<BarSeries, EngineError> {
    let path = match data_override {
        Some(p) => p.to_path_buf(),
        None => adapter
            .get_string("backtest", "data_path")
            .map(PathBuf::from)
            .ok_or_else(|| EngineError::ConfigMissing {
                section: "backtest".into(),
                key: "data_path".into(),
            })?,
    };
    let symbol = adapter
        .get_string("backtest", "symbol")
        .unwrap_or_else(|| "price".to_string());
    let start = parse_optional_date(adapter, "start_date")?;
    let end = parse_optional_date(adapter, "end_date")?;

    info!("loading {} from {}", symbol, path.display());
    let series = CsvAdapter::new(path).fetch_series(&symbol, start, end)?;
    info!("{} bars loaded", series.len());
    Ok(series)
}

/// Split `out/run1` into the report directory `out` and the stem `run1`.
fn report_target(output: &Path) -> (CsvReportAdapter, String) {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = output
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "eventbt".to_string());
    (CsvReportAdapter::new(dir), stem)
}

fn print_summary(result: &RunResult, metrics: &Metrics) {
    println!("=== {} ({}) ===", result.rule, result.policy);
    println!("Final balance:    {:.2}", result.final_cash);
    println!(
        "Net Performance:  {:.2}%",
        result.absolute_performance * 100.0
    );
    println!(
        "Buy and Hold:     {:.2}%",
        result.buy_and_hold_performance * 100.0
    );
    println!(
        "Excess:           {:.2}%",
        result.excess_performance * 100.0
    );
    println!("Total Costs:      {:.2}", result.total_costs);
    println!("Trades Executed:  {}", result.trade_count());
    println!("Round Trips:      {}", metrics.round_trips);
    println!("Exposure:         {:.1}%", metrics.exposure * 100.0);
    println!(
        "Annualized:       {:.2}%",
        metrics.annualized_return * 100.0
    );
    println!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    println!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    println!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    if !result.rejected_orders.is_empty() {
        println!("Rejected Orders:  {}", result.rejected_orders.len());
    }
}

fn run_backtest(
    config_path: &Path,
    data: Option<&Path>,
    policy: Option<&str>,
    output: Option<&Path>,
) -> Result<(), EngineError> {
    let adapter = load_validated(config_path)?;
    let run_config = build_run_config(&adapter)?;
    let policy = build_policy(&adapter, policy)?;
    let rule = build_rule(&adapter)?;
    let series = load_series(&adapter, data)?;

    let result = StrategyRunner::new(&series, run_config).run(&rule, policy)?;
    let risk_free = adapter.get_double("backtest", "risk_free_rate", 0.0);
    let metrics = Metrics::compute(&result, risk_free);
    print_summary(&result, &metrics);

    if let Some(output) = output {
        let (report, stem) = report_target(output);
        report.write(&result, &stem)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), EngineError> {
    let adapter = load_validated(config_path)?;
    for section in adapter.unknown_sections() {
        warn!("{}: section [{}] is not used", config_path.display(), section);
    }
    let rule = build_rule(&adapter)?;
    let policy = build_policy(&adapter, None)?;
    build_run_config(&adapter)?;
    println!("Configuration valid: {} ({})", rule, policy);
    Ok(())
}

fn run_parameter_sweep(
    config_path: &Path,
    data: Option<&Path>,
    top: usize,
    output: Option<&Path>,
) -> Result<(), EngineError> {
    let adapter = load_validated(config_path)?;
    let run_config = build_run_config(&adapter)?;
    let policy = build_policy(&adapter, None)?;
    let rule_name = adapter.get_string("strategy", "rule").unwrap_or_default();
    let rules = build_grid(&adapter)?.rules(&rule_name)?;
    let series = load_series(&adapter, data)?;

    let outcome = run_sweep(&series, &rules, policy, run_config);
    if outcome.results.is_empty() {
        // every combination failed; surface the first reason
        if let Some((_, e)) = outcome.failures.into_iter().next() {
            return Err(e);
        }
        return Err(EngineError::invalid_parameter(
            "sweep",
            "no parameter combinations to run",
        ));
    }

    println!(
        "{:>4}  {:<28} {:>14} {:>10} {:>10} {:>7}",
        "rank", "rule", "final cash", "net %", "excess %", "trades"
    );
    let shown = &outcome.results[..top.min(outcome.results.len())];
    for (rank, r) in shown.iter().enumerate() {
        println!(
            "{:>4}  {:<28} {:>14.2} {:>10.2} {:>10.2} {:>7}",
            rank + 1,
            r.rule.to_string(),
            r.final_cash,
            r.absolute_performance * 100.0,
            r.excess_performance * 100.0,
            r.trade_count()
        );
    }
    if !outcome.failures.is_empty() {
        println!("{} combinations failed", outcome.failures.len());
    }

    if let Some(output) = output {
        let (report, stem) = report_target(output);
        report.write_many(shown, &stem)?;
    }
    Ok(())
}

fn run_vectorized(config_path: &Path, data: Option<&Path>) -> Result<(), EngineError> {
    let adapter = load_validated(config_path)?;
    let run_config = build_run_config(&adapter)?;
    let rule = build_rule(&adapter)?;
    let series = load_series(&adapter, data)?;

    let result = vectorized::backtest(
        &series,
        &rule,
        run_config.costs.proportional,
        run_config.starting_cash,
    )?;

    println!("=== {} (vectorized, long_short) ===", rule);
    println!("Strategy value:   {:.2}", result.strategy_value);
    println!("Buy and Hold:     {:.2}", result.buy_and_hold_value);
    println!("Outperformance:   {:.2}", result.outperformance);
    println!("Position Changes: {}", result.position_changes);
    Ok(())
}
