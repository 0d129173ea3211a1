//! Day-by-day simulation loop.
//!
//! Walks every calendar day of `[start_date, end_date]`, rebalances on the
//! days the frequency policy selects, and records one equity point per day.
//! Days without price rows still get a point, valued from whatever prices
//! are available (usually none, leaving only cash).

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use super::error::SimulationError;
use super::ledger::Ledger;
use super::planner::{calculate_trades, TargetWeights};
use super::prices::PriceTable;
use super::trade::{Side, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceFrequency {
    Daily,
    Weekly,
    Monthly,
    Never,
}

impl RebalanceFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebalanceFrequency::Daily => "daily",
            RebalanceFrequency::Weekly => "weekly",
            RebalanceFrequency::Monthly => "monthly",
            RebalanceFrequency::Never => "never",
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rebalance frequency '{0}' (expected daily, weekly, monthly or never)")]
pub struct UnknownFrequency(pub String);

impl FromStr for RebalanceFrequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RebalanceFrequency::Daily),
            "weekly" => Ok(RebalanceFrequency::Weekly),
            "monthly" => Ok(RebalanceFrequency::Monthly),
            "never" => Ok(RebalanceFrequency::Never),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub rebalance_frequency: RebalanceFrequency,
    /// Reserved: carried and validated, not applied to execution prices.
    pub transaction_cost_bps: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityRecord {
    pub date: NaiveDate,
    pub portfolio_value: f64,
    pub cash: f64,
    pub positions_value: f64,
    /// Whether the date had price rows covering every position held at the
    /// close; otherwise `portfolio_value` understates the holdings.
    pub priced: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSnapshot {
    pub date: NaiveDate,
    pub ticker: String,
    pub shares: f64,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub equity_curve: Vec<EquityRecord>,
    pub trades: Vec<Trade>,
    pub positions_history: Vec<PositionSnapshot>,
    pub ledger: Ledger,
}

impl SimulationResult {
    pub fn final_value(&self) -> Option<f64> {
        self.equity_curve.last().map(|r| r.portfolio_value)
    }
}

/// Decide from dates alone whether `current` is a rebalance day.
pub fn should_rebalance(
    current: NaiveDate,
    last_rebalance: Option<NaiveDate>,
    frequency: RebalanceFrequency,
) -> bool {
    match (frequency, last_rebalance) {
        (RebalanceFrequency::Daily, _) => true,
        (_, None) => true,
        (RebalanceFrequency::Never, Some(_)) => false,
        (RebalanceFrequency::Weekly, Some(last)) => (current - last).num_days() >= 7,
        (RebalanceFrequency::Monthly, Some(last)) => {
            last.month() != current.month() || last.year() != current.year()
        }
    }
}

pub fn apply_trade(ledger: &mut Ledger, trade: &Trade) -> Result<(), SimulationError> {
    match trade.side {
        Side::Sell => ledger.sell(&trade.ticker, trade.shares, trade.price, trade.date),
        Side::Buy => ledger.buy(&trade.ticker, trade.shares, trade.price, trade.date),
    }
}

/// Run a full simulation. The first ledger or planner error aborts the run.
pub fn run_simulation(
    prices: &PriceTable,
    target_weights: &TargetWeights,
    config: &SimulationConfig,
) -> Result<SimulationResult, SimulationError> {
    let mut ledger = Ledger::new(config.initial_cash);
    let mut equity_curve = Vec::new();
    let mut trades = Vec::new();
    let mut positions_history = Vec::new();
    let mut last_rebalance: Option<NaiveDate> = None;

    let mut date = config.start_date;
    while date <= config.end_date {
        let day_prices = prices.prices_on(date);

        if should_rebalance(date, last_rebalance, config.rebalance_frequency) {
            for trade in calculate_trades(&ledger, target_weights, &day_prices, date)? {
                apply_trade(&mut ledger, &trade)?;
                trades.push(trade);
            }
            last_rebalance = Some(date);
        }

        let holdings = ledger.holdings_value(&day_prices);
        for (ticker, value) in &holdings {
            positions_history.push(PositionSnapshot {
                date,
                ticker: ticker.clone(),
                shares: ledger.held_shares(ticker),
                value: *value,
            });
        }

        let fully_priced =
            !day_prices.is_empty() && ledger.tickers().all(|t| day_prices.contains_key(t));

        equity_curve.push(EquityRecord {
            date,
            portfolio_value: ledger.total_value(&day_prices),
            cash: ledger.cash(),
            positions_value: holdings.values().sum(),
            priced: fully_priced,
        });

        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(SimulationResult {
        equity_curve,
        trades,
        positions_history,
        ledger,
    })
}
