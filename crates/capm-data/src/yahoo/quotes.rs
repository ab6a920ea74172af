//! Daily price history from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::prices::{DATE_COLUMN, SYMBOL_COLUMN};
use crate::source::{PriceSource, RawPrices};
use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

/// Column holding the unadjusted close.
pub const CLOSE_COLUMN: &str = "close";

/// Column holding the split and dividend adjusted close.
pub const ADJUSTED_CLOSE_COLUMN: &str = "adjusted_close";

/// Yahoo Finance quote provider with rate limiting.
///
/// Symbols are requested one at a time with `rate_limit_delay` between
/// requests. The result is a stacked table of
/// `symbol, date, close, adjusted_close`.
pub struct YahooQuoteProvider {
    connector: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

/// Daily closes for one symbol, in the order Yahoo returned them.
#[derive(Debug, Default)]
struct DailyCloses {
    days: Vec<i32>,
    close: Vec<f64>,
    adjusted_close: Vec<f64>,
}

impl DailyCloses {
    fn push(&mut self, day: i32, close: f64, adjusted_close: f64) {
        self.days.push(day);
        self.close.push(close);
        self.adjusted_close.push(adjusted_close);
    }

    fn into_frame(self, symbol: &str) -> Result<DataFrame> {
        let height = self.days.len();
        Ok(DataFrame::new(vec![
            Column::new(SYMBOL_COLUMN.into(), vec![symbol; height]),
            Column::new(DATE_COLUMN.into(), self.days).cast(&DataType::Date)?,
            Column::new(CLOSE_COLUMN.into(), self.close),
            Column::new(ADJUSTED_CLOSE_COLUMN.into(), self.adjusted_close),
        ])?)
    }
}

impl YahooQuoteProvider {
    /// Provider with the default delay of 250ms between requests.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(250))
    }

    /// Provider with a custom delay between requests.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            connector: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Delay applied between consecutive requests of a batch.
    pub const fn rate_limit_delay(&self) -> Duration {
        self.rate_limit_delay
    }

    /// Fetch daily closes for one symbol over `[start, end)`.
    ///
    /// # Errors
    /// * [`DataError::InvalidSymbol`] for an empty symbol
    /// * [`DataError::InvalidDateRange`] when `start` is after `end`
    /// * [`DataError::MissingData`] when Yahoo has no quotes in the range
    pub async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        if symbol.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }
        if start > end {
            return Err(DataError::InvalidDateRange { start, end });
        }

        debug!(symbol, %start, %end, "Requesting quote history");
        let response = self
            .connector
            .get_quote_history(symbol, offset_midnight(start)?, offset_midnight(end)?)
            .await?;
        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        let (start_day, end_day) = (epoch_day(start)?, epoch_day(end)?);
        let mut closes = DailyCloses::default();
        for quote in &quotes {
            let day = timestamp_day(quote.timestamp)?;
            // Yahoo includes the end date; keep the range half-open.
            if day >= start_day && day < end_day {
                closes.push(day, quote.close, quote.adjclose);
            }
        }

        if closes.days.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }
        debug!(symbol, rows = closes.days.len(), "Received quote history");

        closes.into_frame(symbol)
    }

    /// Fetch several symbols and stack them into one long table.
    ///
    /// Symbols that fail to fetch are logged and skipped; the call fails only
    /// when no symbol returns data.
    pub async fn fetch_history_batch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        if symbols.is_empty() {
            return Err(DataError::InvalidSymbol("No symbols requested".to_string()));
        }

        let mut frames = Vec::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 {
                sleep(self.rate_limit_delay).await;
            }
            match self.fetch_history(symbol, start, end).await {
                Ok(frame) => frames.push(frame.lazy()),
                Err(e) => warn!(%symbol, error = %e, "Failed to fetch quotes"),
            }
        }

        if frames.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbols.join(","),
                reason: "No data fetched for any symbol".to_string(),
            });
        }

        Ok(concat(frames, UnionArgs::default())?.collect()?)
    }
}

impl PriceSource for YahooQuoteProvider {
    async fn fetch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawPrices> {
        Ok(RawPrices::Table(
            self.fetch_history_batch(symbols, start, end).await?,
        ))
    }
}

fn offset_midnight(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let seconds = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataError::TimeConversion(format!("invalid date {date}")))?
        .and_utc()
        .timestamp();
    time::OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}

fn epoch_day(date: NaiveDate) -> Result<i32> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| DataError::TimeConversion("invalid epoch".to_string()))?;
    i32::try_from((date - epoch).num_days()).map_err(|e| DataError::TimeConversion(e.to_string()))
}

/// UTC calendar day of a quote timestamp, as days since the epoch.
fn timestamp_day(timestamp: i64) -> Result<i32> {
    let date = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| DataError::TimeConversion(format!("invalid timestamp {timestamp}")))?
        .date_naive();
    epoch_day(date)
}
