//! Cash and position ledger.
//!
//! The ledger is the only mutable state in a simulation run. It is owned by
//! the simulation loop and changed exclusively through [`Ledger::buy`] and
//! [`Ledger::sell`]; a rejected order leaves it untouched.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::SimulationError;
use super::position::Position;
use super::prices::PriceMap;

/// Relative slack allowed when a buy's cost overshoots cash by rounding dust.
pub const CASH_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    cash: f64,
    positions: BTreeMap<String, Position>,
    realized_pnl: f64,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Ledger {
            cash: initial_cash,
            positions: BTreeMap::new(),
            realized_pnl: 0.0,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Open positions in ticker order.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    pub fn held_shares(&self, ticker: &str) -> f64 {
        self.positions.get(ticker).map_or(0.0, |pos| pos.shares)
    }

    /// Profit locked in by sells: shares * (sell price - avg cost), summed.
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Cash plus the market value of every position that has a price.
    /// Unpriced positions are left out of the sum.
    pub fn total_value(&self, prices: &PriceMap) -> f64 {
        self.cash + self.holdings_value(prices).values().sum::<f64>()
    }

    pub fn holdings_value(&self, prices: &PriceMap) -> BTreeMap<String, f64> {
        self.positions
            .values()
            .filter_map(|pos| {
                prices
                    .get(&pos.ticker)
                    .map(|&price| (pos.ticker.clone(), pos.market_value(price)))
            })
            .collect()
    }

    /// Paper gain or loss across priced positions; unpriced ones contribute 0.
    pub fn unrealized_pnl(&self, prices: &PriceMap) -> f64 {
        self.positions
            .values()
            .filter_map(|pos| {
                prices
                    .get(&pos.ticker)
                    .map(|&price| pos.unrealized_pnl(price))
            })
            .sum()
    }

    pub fn buy(
        &mut self,
        ticker: &str,
        shares: f64,
        price: f64,
        date: NaiveDate,
    ) -> Result<(), SimulationError> {
        if shares.is_nan() || shares <= 0.0 {
            return Err(SimulationError::InvalidOrder {
                ticker: ticker.to_string(),
                shares,
            });
        }

        let cost = shares * price;
        if cost > self.cash + CASH_TOLERANCE * self.cash.max(1.0) {
            return Err(SimulationError::InsufficientCash {
                ticker: ticker.to_string(),
                required: cost,
                available: self.cash,
            });
        }

        self.cash = (self.cash - cost).max(0.0);

        match self.positions.get_mut(ticker) {
            Some(existing) => existing.add_shares(shares, price),
            None => {
                self.positions
                    .insert(ticker.to_string(), Position::new(ticker, shares, price, date));
            }
        }
        Ok(())
    }

    pub fn sell(
        &mut self,
        ticker: &str,
        shares: f64,
        price: f64,
        _date: NaiveDate,
    ) -> Result<(), SimulationError> {
        if shares.is_nan() || shares <= 0.0 {
            return Err(SimulationError::InvalidOrder {
                ticker: ticker.to_string(),
                shares,
            });
        }

        let position = self
            .positions
            .get_mut(ticker)
            .ok_or_else(|| SimulationError::NoPosition {
                ticker: ticker.to_string(),
            })?;

        if shares > position.shares {
            return Err(SimulationError::InsufficientShares {
                ticker: ticker.to_string(),
                requested: shares,
                held: position.shares,
            });
        }

        self.cash += shares * price;
        self.realized_pnl += shares * (price - position.avg_cost);

        position.shares -= shares;
        if position.shares <= 0.0 {
            self.positions.remove(ticker);
        }
        Ok(())
    }
}
