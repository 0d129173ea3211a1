//! Long-form CSV price file adapter.
//!
//! Expects a header naming `date`, `ticker` and `close` columns in any order
//! and any case; other columns are ignored.

use crate::domain::error::FactorlabError;
use crate::domain::prices::PriceRow;
use crate::ports::data_port::PriceSource;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub struct CsvPriceAdapter {
    path: PathBuf,
}

struct Columns {
    date: usize,
    ticker: usize,
    close: usize,
}

impl CsvPriceAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn data_error(reason: String) -> FactorlabError {
        FactorlabError::Data { reason }
    }

    fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, FactorlabError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| Self::data_error(format!("missing {name} column")))
        };
        Ok(Columns {
            date: find("date")?,
            ticker: find("ticker")?,
            close: find("close")?,
        })
    }

    fn field<'a>(
        record: &'a csv::StringRecord,
        index: usize,
        name: &str,
        line: u64,
    ) -> Result<&'a str, FactorlabError> {
        record
            .get(index)
            .map(str::trim)
            .ok_or_else(|| Self::data_error(format!("line {line}: missing {name} value")))
    }

    /// Every row in the file, in file order.
    fn read_rows(&self) -> Result<Vec<PriceRow>, FactorlabError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Self::data_error(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::data_error(format!("CSV header error: {}", e)))?
            .clone();
        let columns = Self::locate_columns(&headers)?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| Self::data_error(format!("CSV parse error: {}", e)))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let date_str = Self::field(&record, columns.date, "date", line)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                Self::data_error(format!("line {line}: invalid date '{date_str}': {e}"))
            })?;

            let ticker = Self::field(&record, columns.ticker, "ticker", line)?.to_uppercase();
            if ticker.is_empty() {
                return Err(Self::data_error(format!("line {line}: empty ticker")));
            }

            let close_str = Self::field(&record, columns.close, "close", line)?;
            let close: f64 = close_str.parse().map_err(|e| {
                Self::data_error(format!("line {line}: invalid close '{close_str}': {e}"))
            })?;
            if !close.is_finite() || close <= 0.0 {
                return Err(Self::data_error(format!(
                    "line {line}: close must be positive, got {close}"
                )));
            }

            rows.push(PriceRow {
                date,
                ticker,
                close,
            });
        }
        Ok(rows)
    }
}

impl PriceSource for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceRow>, FactorlabError> {
        let wanted: Vec<String> = tickers.iter().map(|t| t.to_uppercase()).collect();
        let mut rows: Vec<PriceRow> = self
            .read_rows()?
            .into_iter()
            .filter(|r| r.date >= start_date && r.date <= end_date)
            .filter(|r| wanted.is_empty() || wanted.contains(&r.ticker))
            .collect();

        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
        Ok(rows)
    }

    fn list_tickers(&self) -> Result<Vec<String>, FactorlabError> {
        let mut tickers: Vec<String> = self.read_rows()?.into_iter().map(|r| r.ticker).collect();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FactorlabError> {
        let ticker = ticker.to_uppercase();
        let mut dates: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for row in self.read_rows()?.into_iter().filter(|r| r.ticker == ticker) {
            *dates.entry(row.date).or_default() += 1;
        }

        let first = dates.keys().next().copied();
        let last = dates.keys().next_back().copied();
        Ok(first.zip(last).map(|(first, last)| (first, last, dates.values().sum())))
    }
}
