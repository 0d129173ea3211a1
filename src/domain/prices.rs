//! Long-form daily close prices indexed by date.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Ticker -> close price for a single date.
pub type PriceMap = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
}

impl PriceRow {
    pub fn new(date: NaiveDate, ticker: &str, close: f64) -> Self {
        PriceRow {
            date,
            ticker: ticker.to_string(),
            close,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    by_date: BTreeMap<NaiveDate, PriceMap>,
}

impl PriceTable {
    /// A later row for the same (date, ticker) replaces an earlier one.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = PriceRow>,
    {
        let mut by_date: BTreeMap<NaiveDate, PriceMap> = BTreeMap::new();
        for row in rows {
            by_date.entry(row.date).or_default().insert(row.ticker, row.close);
        }
        PriceTable { by_date }
    }

    /// All prices recorded on `date`; empty when the date has no rows.
    pub fn prices_on(&self, date: NaiveDate) -> PriceMap {
        self.by_date.get(&date).cloned().unwrap_or_default()
    }

    pub fn tickers(&self) -> Vec<String> {
        let unique: BTreeSet<&String> = self.by_date.values().flat_map(|m| m.keys()).collect();
        unique.into_iter().cloned().collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.by_date.keys().next_back().copied()
    }

    pub fn date_count(&self) -> usize {
        self.by_date.len()
    }

    pub fn row_count(&self) -> usize {
        self.by_date.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Drop every date on which any of `tickers` lacks a price.
    pub fn retain_complete_dates(&mut self, tickers: &[String]) {
        self.by_date
            .retain(|_, m| tickers.iter().all(|t| m.contains_key(t)));
    }
}
