//! Errors raised while fetching and shaping price data.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors from price sources and price table extraction.
#[derive(Debug, Error)]
pub enum DataError {
    /// Request for an empty or blank ticker.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Requested history starts after it ends.
    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// First requested date.
        start: NaiveDate,
        /// End of the requested history.
        end: NaiveDate,
    },

    /// A source answered but had no prices for the symbol.
    #[error("no prices for {symbol}: {reason}")]
    MissingData {
        /// Symbol, or comma-joined symbols, that came back empty.
        symbol: String,
        /// What the source reported.
        reason: String,
    },

    /// Yahoo Finance request or response failure.
    #[error("Yahoo Finance: {0}")]
    YahooApi(String),

    /// Malformed price file contents.
    #[error("malformed price data: {0}")]
    Parse(String),

    /// No layout recognised the price table, or it held no usable price column.
    #[error("cannot extract prices: {0}")]
    Extraction(String),

    /// Requested symbol is absent from the extracted prices.
    #[error("symbol {0} not present in price data")]
    MissingSymbol(String),

    /// Date or timestamp out of representable range.
    #[error("time conversion: {0}")]
    TimeConversion(String),

    /// DataFrame operation failure.
    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    /// CSV reader failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// File access failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}
