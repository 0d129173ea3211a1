//! Price data access port trait.

use crate::domain::error::FactorlabError;
use crate::domain::prices::PriceRow;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Close prices for `tickers` within `[start_date, end_date]`, sorted by
    /// date then ticker. An empty `tickers` slice means every ticker.
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceRow>, FactorlabError>;

    fn list_tickers(&self) -> Result<Vec<String>, FactorlabError>;

    /// First date, last date and row count for a ticker, if it has any rows.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FactorlabError>;
}
