//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::FactorlabError;
use crate::domain::simulation::RebalanceFrequency;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Weights may exceed 1 by this much to absorb decimal rounding in config files.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), FactorlabError> {
    validate_initial_cash(config)?;
    validate_dates(config)?;
    validate_frequency(config)?;
    validate_transaction_cost(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

pub fn validate_weights(config: &dyn ConfigPort) -> Result<(), FactorlabError> {
    let entries = config.get_section("weights");
    if entries.is_empty() {
        return Err(FactorlabError::ConfigMissing {
            section: "weights".to_string(),
            key: "<ticker>".to_string(),
        });
    }

    let mut total = 0.0;
    for (ticker, raw) in &entries {
        let weight = parse_weight(ticker, raw)?;
        total += weight;
    }

    if total > 1.0 + WEIGHT_SUM_TOLERANCE {
        return Err(FactorlabError::ConfigInvalid {
            section: "weights".to_string(),
            key: "*".to_string(),
            reason: format!("weights sum to {total}, which exceeds 1"),
        });
    }
    Ok(())
}

/// Parse a single `[weights]` value; it must be a finite, non-negative number.
pub fn parse_weight(ticker: &str, raw: &str) -> Result<f64, FactorlabError> {
    let invalid = |reason: String| FactorlabError::ConfigInvalid {
        section: "weights".to_string(),
        key: ticker.to_uppercase(),
        reason,
    };
    let weight: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(format!("'{raw}' is not a number")))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(invalid(format!(
            "weight must be finite and non-negative, got {weight}"
        )));
    }
    Ok(weight)
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), FactorlabError> {
    let value = config.get_double("backtest", "initial_cash", 0.0);
    if !(value.is_finite() && value > 0.0) {
        return Err(FactorlabError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_cash".to_string(),
            reason: "initial_cash must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), FactorlabError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(FactorlabError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, FactorlabError> {
    match value {
        None => Err(FactorlabError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            FactorlabError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

pub fn parse_frequency(config: &dyn ConfigPort) -> Result<RebalanceFrequency, FactorlabError> {
    match config.get_string("backtest", "rebalance_frequency") {
        None => Err(FactorlabError::ConfigMissing {
            section: "backtest".to_string(),
            key: "rebalance_frequency".to_string(),
        }),
        Some(s) => s
            .parse::<RebalanceFrequency>()
            .map_err(|e| FactorlabError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "rebalance_frequency".to_string(),
                reason: e.to_string(),
            }),
    }
}

fn validate_frequency(config: &dyn ConfigPort) -> Result<(), FactorlabError> {
    parse_frequency(config).map(|_| ())
}

fn validate_transaction_cost(config: &dyn ConfigPort) -> Result<(), FactorlabError> {
    let value = config.get_double("backtest", "transaction_cost_bps", 0.0);
    if !(value.is_finite() && value >= 0.0) {
        return Err(FactorlabError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "transaction_cost_bps".to_string(),
            reason: "transaction_cost_bps must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), FactorlabError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(FactorlabError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const BASE: &str = "[backtest]\n\
        start_date = 2024-01-01\n\
        end_date = 2024-12-31\n\
        rebalance_frequency = monthly\n";

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with_base(extra: &str) -> FileConfigAdapter {
        make_config(&format!("{BASE}{extra}"))
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_cash = 100000.0
start_date = 2024-01-01
end_date = 2024-12-31
rebalance_frequency = weekly
transaction_cost_bps = 5
risk_free_rate = 0.02
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn initial_cash_must_be_positive() {
        let config = with_base("initial_cash = -100\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "initial_cash"));
    }

    #[test]
    fn missing_initial_cash_fails() {
        let config = with_base("");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "initial_cash"));
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config(
            "[backtest]\ninitial_cash = 100\nstart_date = 2024/01/01\nend_date = 2024-12-31\nrebalance_frequency = daily\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_end_date_fails() {
        let config = make_config(
            "[backtest]\ninitial_cash = 100\nstart_date = 2024-01-01\nrebalance_frequency = daily\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config(
            "[backtest]\ninitial_cash = 100\nstart_date = 2024-12-31\nend_date = 2024-01-01\nrebalance_frequency = daily\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn single_day_range_is_valid() {
        let config = make_config(
            "[backtest]\ninitial_cash = 100\nstart_date = 2024-03-01\nend_date = 2024-03-01\nrebalance_frequency = never\n",
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn unknown_frequency_fails() {
        let config = make_config(
            "[backtest]\ninitial_cash = 100\nstart_date = 2024-01-01\nend_date = 2024-12-31\nrebalance_frequency = hourly\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "rebalance_frequency")
        );
    }

    #[test]
    fn missing_frequency_fails() {
        let config = make_config(
            "[backtest]\ninitial_cash = 100\nstart_date = 2024-01-01\nend_date = 2024-12-31\n",
        );
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, FactorlabError::ConfigMissing { key, .. } if key == "rebalance_frequency")
        );
    }

    #[test]
    fn frequency_is_case_insensitive() {
        let config = make_config("[backtest]\nrebalance_frequency = Monthly\n");
        assert_eq!(parse_frequency(&config).unwrap(), RebalanceFrequency::Monthly);
    }

    #[test]
    fn negative_transaction_cost_fails() {
        let config = with_base("initial_cash = 100\ntransaction_cost_bps = -1\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "transaction_cost_bps")
        );
    }

    #[test]
    fn risk_free_rate_out_of_range_fails() {
        let config = with_base("initial_cash = 100\nrisk_free_rate = 1.5\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "risk_free_rate")
        );
    }

    #[test]
    fn risk_free_rate_negative_fails() {
        let config = with_base("initial_cash = 100\nrisk_free_rate = -0.05\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "risk_free_rate")
        );
    }

    #[test]
    fn valid_weights_pass() {
        let config = make_config("[weights]\nAAPL = 0.49\nMSFT = 0.3\nGOOGL = 0.21\n");
        assert!(validate_weights(&config).is_ok());
    }

    #[test]
    fn missing_weights_section_fails() {
        let config = make_config("[backtest]\ninitial_cash = 100\n");
        let err = validate_weights(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigMissing { section, .. } if section == "weights"));
    }

    #[test]
    fn negative_weight_fails() {
        let config = make_config("[weights]\nAAPL = -0.1\n");
        let err = validate_weights(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "AAPL"));
    }

    #[test]
    fn non_numeric_weight_fails() {
        let config = make_config("[weights]\nAAPL = lots\n");
        let err = validate_weights(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigInvalid { key, .. } if key == "AAPL"));
    }

    #[test]
    fn weights_above_one_fail() {
        let config = make_config("[weights]\nAAPL = 0.6\nMSFT = 0.5\n");
        let err = validate_weights(&config).unwrap_err();
        assert!(matches!(err, FactorlabError::ConfigInvalid { section, .. } if section == "weights"));
    }

    #[test]
    fn weights_summing_to_one_pass() {
        let config = make_config("[weights]\nA = 0.1\nB = 0.2\nC = 0.7\n");
        assert!(validate_weights(&config).is_ok());
    }

    #[test]
    fn zero_weight_is_allowed() {
        let config = make_config("[weights]\nAAPL = 0\n");
        assert!(validate_weights(&config).is_ok());
    }
}
