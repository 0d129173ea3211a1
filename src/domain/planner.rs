//! Rebalancing: turn target weights into an ordered list of trades.
//!
//! Sizing works on the ledger's total value at today's prices:
//!
//! ```text
//! target_shares = weight * total_value / price
//! delta         = target_shares - held_shares
//! ```
//!
//! Sells come first so their proceeds fund the buys of the same rebalance.
//! Within each side trades are ordered by ticker.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use super::error::SimulationError;
use super::ledger::Ledger;
use super::prices::PriceMap;
use super::trade::Trade;

/// Ticker -> fraction of total portfolio value. Unallocated weight is cash.
pub type TargetWeights = HashMap<String, f64>;

/// Share deltas at or below this size are not traded.
pub const SHARE_EPSILON: f64 = 1e-9;

/// Compute the trades that move `ledger` to `target_weights` at `prices`.
///
/// Held tickers missing from `target_weights` are liquidated. A ticker with a
/// non-zero target and no usable price fails with `MissingPrice`; a held
/// ticker targeted at zero but unpriced today is left alone.
pub fn calculate_trades(
    ledger: &Ledger,
    target_weights: &TargetWeights,
    prices: &PriceMap,
    trade_date: NaiveDate,
) -> Result<Vec<Trade>, SimulationError> {
    let total_value = ledger.total_value(prices);
    if total_value.is_nan() || total_value <= 0.0 {
        return Err(SimulationError::InvalidState { total_value });
    }

    let universe: BTreeSet<&str> = target_weights
        .keys()
        .map(String::as_str)
        .chain(ledger.tickers())
        .collect();

    let mut sells = Vec::new();
    let mut buys = Vec::new();

    for ticker in universe {
        let weight = target_weights.get(ticker).copied().unwrap_or(0.0);
        let price = match prices.get(ticker).copied().filter(|p| *p > 0.0) {
            Some(price) => price,
            None if weight == 0.0 => continue,
            None => {
                return Err(SimulationError::MissingPrice {
                    ticker: ticker.to_string(),
                    date: trade_date,
                });
            }
        };

        let target_shares = weight * total_value / price;
        let delta = target_shares - ledger.held_shares(ticker);
        if delta.abs() <= SHARE_EPSILON {
            continue;
        }

        if delta > 0.0 {
            buys.push(Trade::buy(trade_date, ticker, delta, price));
        } else {
            sells.push(Trade::sell(trade_date, ticker, -delta, price));
        }
    }

    sells.extend(buys);
    Ok(sells)
}
