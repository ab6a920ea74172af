//! The price source contract.
//!
//! A [`PriceSource`] hands back whatever shape of table its backend produces.
//! Turning that into per-symbol series is the job of
//! [`PriceExtractor`](crate::prices::PriceExtractor).

use crate::error::Result;
use crate::prices::DATE_COLUMN;
use chrono::NaiveDate;
use polars::prelude::*;
use std::future::Future;

/// Raw price data as returned by a source.
#[derive(Debug, Clone)]
pub enum RawPrices {
    /// A table with a `date` column and one or more price columns.
    Table(DataFrame),
    /// A single price series; the value column's name is the series name.
    Series {
        /// Observation dates.
        dates: Column,
        /// Prices, aligned with `dates`.
        values: Column,
    },
}

impl RawPrices {
    /// Number of rows.
    pub fn height(&self) -> usize {
        match self {
            Self::Table(frame) => frame.height(),
            Self::Series { values, .. } => values.len(),
        }
    }

    /// Whether there are no rows at all.
    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    /// View the prices as a table. A series becomes a two-column frame.
    pub fn to_frame(&self) -> Result<DataFrame> {
        match self {
            Self::Table(frame) => Ok(frame.clone()),
            Self::Series { dates, values } => Ok(DataFrame::new(vec![
                dates.clone().with_name(DATE_COLUMN.into()),
                values.clone(),
            ])?),
        }
    }
}

impl From<DataFrame> for RawPrices {
    fn from(frame: DataFrame) -> Self {
        Self::Table(frame)
    }
}

/// A provider of historical prices.
///
/// Given symbols and a half-open date range `[start, end)`, returns a table of
/// prices that includes an adjusted-close field (or a single price field).
pub trait PriceSource {
    /// Fetch prices for `symbols` between `start` (inclusive) and `end` (exclusive).
    fn fetch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<RawPrices>> + Send;
}
