//! Open holdings tracked by the ledger.

use chrono::NaiveDate;

/// An open long holding in a single ticker.
///
/// `avg_cost` is the weighted-average purchase price; only buys move it.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub shares: f64,
    pub avg_cost: f64,
    pub opened_on: NaiveDate,
}

impl Position {
    pub fn new(ticker: &str, shares: f64, price: f64, opened_on: NaiveDate) -> Self {
        Position {
            ticker: ticker.to_string(),
            shares,
            avg_cost: price,
            opened_on,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares * (price - self.avg_cost)
    }

    /// Fold an additional purchase into the position, re-averaging the cost.
    /// The entry date is kept.
    pub fn add_shares(&mut self, shares: f64, price: f64) {
        let total_shares = self.shares + shares;
        self.avg_cost = (self.shares * self.avg_cost + shares * price) / total_shares;
        self.shares = total_shares;
    }
}
