//! Trade records produced by the planner and replayed into the ledger.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub ticker: String,
    pub shares: f64,
    pub price: f64,
    pub side: Side,
}

impl Trade {
    pub fn buy(date: NaiveDate, ticker: &str, shares: f64, price: f64) -> Self {
        Trade {
            date,
            ticker: ticker.to_string(),
            shares,
            price,
            side: Side::Buy,
        }
    }

    pub fn sell(date: NaiveDate, ticker: &str, shares: f64, price: f64) -> Self {
        Trade {
            date,
            ticker: ticker.to_string(),
            shares,
            price,
            side: Side::Sell,
        }
    }

    /// shares * price
    pub fn notional(&self) -> f64 {
        self.shares * self.price
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }
}
