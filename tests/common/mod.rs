#![allow(dead_code)]

use chrono::NaiveDate;
use factorlab::domain::error::FactorlabError;
pub use factorlab::domain::prices::{PriceRow, PriceTable};
use factorlab::domain::planner::TargetWeights;
use factorlab::domain::simulation::{RebalanceFrequency, SimulationConfig};
use factorlab::ports::data_port::PriceSource;
use std::collections::HashMap;

pub struct MockPriceSource {
    pub rows: Vec<PriceRow>,
    pub error: Option<String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            error: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<PriceRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), FactorlabError> {
        match &self.error {
            Some(reason) => Err(FactorlabError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceRow>, FactorlabError> {
        self.check()?;
        let mut rows: Vec<PriceRow> = self
            .rows
            .iter()
            .filter(|r| r.date >= start_date && r.date <= end_date)
            .filter(|r| tickers.is_empty() || tickers.contains(&r.ticker))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
        Ok(rows)
    }

    fn list_tickers(&self) -> Result<Vec<String>, FactorlabError> {
        self.check()?;
        let mut tickers: Vec<String> = self.rows.iter().map(|r| r.ticker.clone()).collect();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FactorlabError> {
        self.check()?;
        let dates: Vec<NaiveDate> = self
            .rows
            .iter()
            .filter(|r| r.ticker == ticker)
            .map(|r| r.date)
            .collect();
        match (dates.iter().min(), dates.iter().max()) {
            (Some(min), Some(max)) => Ok(Some((*min, *max, dates.len()))),
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One row per (date, close) pair for a single ticker.
pub fn make_rows(ticker: &str, prices: &[(NaiveDate, f64)]) -> Vec<PriceRow> {
    prices
        .iter()
        .map(|(d, close)| PriceRow::new(*d, ticker, *close))
        .collect()
}

/// Weekday rows from `start` for `days` calendar days, following `close_fn(i)`
/// where `i` counts calendar days from `start`.
pub fn weekday_rows(
    ticker: &str,
    start: NaiveDate,
    days: i64,
    close_fn: impl Fn(i64) -> f64,
) -> Vec<PriceRow> {
    use chrono::Datelike;
    (0..days)
        .filter_map(|i| {
            let d = start + chrono::Duration::days(i);
            let weekday = d.weekday().number_from_monday();
            (weekday <= 5).then(|| PriceRow::new(d, ticker, close_fn(i)))
        })
        .collect()
}

pub fn weights(pairs: &[(&str, f64)]) -> TargetWeights {
    pairs
        .iter()
        .map(|(t, w)| (t.to_string(), *w))
        .collect::<HashMap<_, _>>()
}

pub fn sample_config(
    start: NaiveDate,
    end: NaiveDate,
    initial_cash: f64,
    frequency: RebalanceFrequency,
) -> SimulationConfig {
    SimulationConfig {
        start_date: start,
        end_date: end,
        initial_cash,
        rebalance_frequency: frequency,
        transaction_cost_bps: 0.0,
    }
}
