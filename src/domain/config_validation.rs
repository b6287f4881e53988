//! Configuration validation.
//!
//! Validates all config fields before a run is built.

use crate::domain::error::EngineError;
use crate::domain::policy::PositionPolicy;
use crate::domain::signal::SignalRule;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    validate_initial_capital(config)?;
    validate_costs(config)?;
    validate_policy(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let rule = validate_rule_name(config)?;
    match rule.as_str() {
        "sma" | "sma_crossover" => {
            let fast = validate_window(config, "fast")?;
            let slow = validate_window(config, "slow")?;
            if fast > slow {
                return Err(invalid("strategy", "fast", "fast must not exceed slow"));
            }
        }
        "momentum" => {
            validate_window(config, "window")?;
        }
        _ => {
            validate_window(config, "window")?;
            validate_threshold(config)?;
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> EngineError {
    EngineError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(section: &str, key: &str) -> EngineError {
    EngineError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let fixed = config.get_double("backtest", "fixed_cost", 0.0);
    if fixed < 0.0 {
        return Err(invalid(
            "backtest",
            "fixed_cost",
            "fixed_cost must be non-negative",
        ));
    }
    let proportional = config.get_double("backtest", "proportional_cost", 0.0);
    if !(0.0..1.0).contains(&proportional) {
        return Err(invalid(
            "backtest",
            "proportional_cost",
            "proportional_cost must be in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_policy(config: &dyn ConfigPort) -> Result<(), EngineError> {
    if let Some(policy) = config.get_string("backtest", "policy") {
        policy
            .parse::<PositionPolicy>()
            .map_err(|_| invalid("backtest", "policy", "expected long_only or long_short"))?;
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    field: &str,
) -> Result<Option<NaiveDate>, EngineError> {
    match config.get_string("backtest", field) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "backtest",
                    field,
                    &format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}

fn validate_rule_name(config: &dyn ConfigPort) -> Result<String, EngineError> {
    let rule = config
        .get_string("strategy", "rule")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing("strategy", "rule"))?;
    let normalized = rule.trim().to_lowercase().replace('-', "_");
    match normalized.as_str() {
        "sma" | "sma_crossover" | "momentum" | "mean_reversion" => Ok(normalized),
        _ => Err(invalid(
            "strategy",
            "rule",
            &format!("expected one of {}", SignalRule::NAMES.join(", ")),
        )),
    }
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<i64, EngineError> {
    if config.get_string("strategy", key).is_none() {
        return Err(missing("strategy", key));
    }
    let value = config.get_int("strategy", key, 0);
    if value < 1 {
        return Err(invalid(
            "strategy",
            key,
            &format!("{} must be a positive integer", key),
        ));
    }
    Ok(value)
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), EngineError> {
    if config.get_string("strategy", "threshold").is_none() {
        return Err(missing("strategy", "threshold"));
    }
    let value = config.get_double("strategy", "threshold", -1.0);
    if value < 0.0 {
        return Err(invalid(
            "strategy",
            "threshold",
            "threshold must be a non-negative number",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn with(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn valid_backtest() -> MockConfig {
        MockConfig::new()
            .with("backtest", "initial_capital", "10000")
            .with("backtest", "fixed_cost", "10.0")
            .with("backtest", "proportional_cost", "0.005")
            .with("backtest", "policy", "long_short")
            .with("backtest", "start_date", "2010-01-01")
            .with("backtest", "end_date", "2016-10-31")
    }

    fn expect_invalid_key(result: Result<(), EngineError>, expected: &str) {
        match result {
            Err(EngineError::ConfigInvalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected ConfigInvalid for {expected}, got {other:?}"),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        assert!(validate_backtest_config(&valid_backtest()).is_ok());
    }

    #[test]
    fn dates_are_optional() {
        let config = MockConfig::new().with("backtest", "initial_capital", "100");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn rejects_zero_capital() {
        let config = valid_backtest().with("backtest", "initial_capital", "0");
        expect_invalid_key(validate_backtest_config(&config), "initial_capital");
    }

    #[test]
    fn rejects_negative_fixed_cost() {
        let config = valid_backtest().with("backtest", "fixed_cost", "-1");
        expect_invalid_key(validate_backtest_config(&config), "fixed_cost");
    }

    #[test]
    fn rejects_proportional_cost_of_one() {
        let config = valid_backtest().with("backtest", "proportional_cost", "1.0");
        expect_invalid_key(validate_backtest_config(&config), "proportional_cost");
    }

    #[test]
    fn rejects_unknown_policy() {
        let config = valid_backtest().with("backtest", "policy", "short_only");
        expect_invalid_key(validate_backtest_config(&config), "policy");
    }

    #[test]
    fn rejects_reversed_dates() {
        let config = valid_backtest()
            .with("backtest", "start_date", "2020-01-01")
            .with("backtest", "end_date", "2019-01-01");
        expect_invalid_key(validate_backtest_config(&config), "start_date");
    }

    #[test]
    fn rejects_bad_date_format() {
        let config = valid_backtest().with("backtest", "end_date", "31/10/2016");
        expect_invalid_key(validate_backtest_config(&config), "end_date");
    }

    #[test]
    fn valid_sma_strategy() {
        let config = MockConfig::new()
            .with("strategy", "rule", "sma")
            .with("strategy", "fast", "42")
            .with("strategy", "slow", "252");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn sma_fast_above_slow_rejected() {
        let config = MockConfig::new()
            .with("strategy", "rule", "sma")
            .with("strategy", "fast", "50")
            .with("strategy", "slow", "20");
        expect_invalid_key(validate_strategy_config(&config), "fast");
    }

    #[test]
    fn missing_rule_reported() {
        let result = validate_strategy_config(&MockConfig::new());
        assert!(matches!(result, Err(EngineError::ConfigMissing { ref key, .. }) if key == "rule"));
    }

    #[test]
    fn unknown_rule_rejected() {
        let config = MockConfig::new().with("strategy", "rule", "macd");
        expect_invalid_key(validate_strategy_config(&config), "rule");
    }

    #[test]
    fn momentum_requires_window() {
        let config = MockConfig::new().with("strategy", "rule", "momentum");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(EngineError::ConfigMissing { ref key, .. }) if key == "window"
        ));
    }

    #[test]
    fn momentum_rejects_zero_window() {
        let config = MockConfig::new()
            .with("strategy", "rule", "momentum")
            .with("strategy", "window", "0");
        expect_invalid_key(validate_strategy_config(&config), "window");
    }

    #[test]
    fn mean_reversion_requires_threshold() {
        let config = MockConfig::new()
            .with("strategy", "rule", "mean_reversion")
            .with("strategy", "window", "50");
        assert!(matches!(
            validate_strategy_config(&config),
            Err(EngineError::ConfigMissing { ref key, .. }) if key == "threshold"
        ));
    }

    #[test]
    fn mean_reversion_rejects_negative_threshold() {
        let config = MockConfig::new()
            .with("strategy", "rule", "mean_reversion")
            .with("strategy", "window", "50")
            .with("strategy", "threshold", "-2");
        expect_invalid_key(validate_strategy_config(&config), "threshold");
    }
}
