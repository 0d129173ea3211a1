//! Domain error types.

/// Failures raised by the ledger and the trade planner during a run.
///
/// None of these are recovered inside the simulation: the first one aborts
/// the run and is handed back to the caller as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid order for {ticker}: share count must be positive, got {shares}")]
    InvalidOrder { ticker: String, shares: f64 },

    #[error("insufficient cash to buy {ticker}: need {required:.2}, have {available:.2}")]
    InsufficientCash {
        ticker: String,
        required: f64,
        available: f64,
    },

    #[error("no open position in {ticker}")]
    NoPosition { ticker: String },

    #[error("insufficient shares of {ticker}: trying to sell {requested}, only own {held}")]
    InsufficientShares {
        ticker: String,
        requested: f64,
        held: f64,
    },

    #[error("missing price for {ticker} on {date}")]
    MissingPrice {
        ticker: String,
        date: chrono::NaiveDate,
    },

    #[error("invalid portfolio state: total value {total_value} is not positive")]
    InvalidState { total_value: f64 },
}

/// Top-level error type for factorlab.
#[derive(Debug, thiserror::Error)]
pub enum FactorlabError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price data error: {reason}")]
    Data { reason: String },

    #[error("no price data: {reason}")]
    NoData { reason: String },

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FactorlabError> for std::process::ExitCode {
    fn from(err: &FactorlabError) -> Self {
        let code: u8 = match err {
            FactorlabError::Io(_) => 1,
            FactorlabError::ConfigParse { .. }
            | FactorlabError::ConfigMissing { .. }
            | FactorlabError::ConfigInvalid { .. } => 2,
            FactorlabError::Data { .. } => 3,
            FactorlabError::Simulation(_) => 4,
            FactorlabError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
