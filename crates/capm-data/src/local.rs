//! Price sources that need no network: an in-memory table and a CSV file.

use crate::error::{DataError, Result};
use crate::prices::{DATE_COLUMN, SYMBOL_COLUMN};
use crate::source::{PriceSource, RawPrices};
use chrono::NaiveDate;
use polars::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source that always returns the same prices, regardless of the request.
#[derive(Debug, Clone)]
pub struct FramePriceSource {
    prices: RawPrices,
}

impl FramePriceSource {
    /// Wrap prices already held in memory.
    pub fn new(prices: impl Into<RawPrices>) -> Self {
        Self {
            prices: prices.into(),
        }
    }
}

impl PriceSource for FramePriceSource {
    async fn fetch(
        &self,
        _symbols: &[String],
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<RawPrices> {
        Ok(self.prices.clone())
    }
}

/// Prices read from a CSV file.
///
/// The first column must be `date` (`YYYY-MM-DD`). An optional `symbol`
/// column holds tickers for a stacked table; every other column is parsed as
/// a price, with empty cells read as missing. The headers decide the layout,
/// so any shape understood by [`PriceExtractor`](crate::PriceExtractor) works.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    /// Source backed by the CSV file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceSource for CsvPriceSource {
    async fn fetch(
        &self,
        _symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawPrices> {
        debug!(path = %self.path.display(), "Reading price file");
        let file = std::fs::File::open(&self.path)?;
        Ok(RawPrices::Table(read_price_csv(file, start, end)?))
    }
}

enum CsvColumn {
    Symbol(Vec<String>),
    Price(String, Vec<Option<f64>>),
}

/// Parse a price CSV, keeping rows dated within `[start, end)`.
pub fn read_price_csv<R: Read>(reader: R, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    match headers.get(0) {
        Some(first) if first.trim().eq_ignore_ascii_case(DATE_COLUMN) => {}
        _ => {
            return Err(DataError::Parse(format!(
                "first CSV column must be '{DATE_COLUMN}'"
            )));
        }
    }

    let mut columns: Vec<CsvColumn> = headers
        .iter()
        .skip(1)
        .map(|h| {
            let h = h.trim();
            if h.eq_ignore_ascii_case(SYMBOL_COLUMN) {
                CsvColumn::Symbol(Vec::new())
            } else {
                CsvColumn::Price(h.to_string(), Vec::new())
            }
        })
        .collect();
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| DataError::TimeConversion("invalid epoch".to_string()))?;
    let mut days: Vec<i32> = Vec::new();

    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default().trim();
        let row = line + 1;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| DataError::Parse(format!("row {row}: bad date '{raw_date}': {e}")))?;
        if date < start || date >= end {
            continue;
        }
        days.push(
            i32::try_from((date - epoch).num_days())
                .map_err(|e| DataError::TimeConversion(e.to_string()))?,
        );

        for (i, column) in columns.iter_mut().enumerate() {
            let cell = record.get(i + 1).unwrap_or_default().trim();
            match column {
                CsvColumn::Symbol(values) => values.push(cell.to_string()),
                CsvColumn::Price(name, values) => {
                    let value = if cell.is_empty() {
                        None
                    } else {
                        Some(cell.parse::<f64>().map_err(|e| {
                            DataError::Parse(format!("row {row}: bad {name} '{cell}': {e}"))
                        })?)
                    };
                    values.push(value);
                }
            }
        }
    }

    let mut frame_columns = vec![Column::new(DATE_COLUMN.into(), days).cast(&DataType::Date)?];
    for column in columns {
        frame_columns.push(match column {
            CsvColumn::Symbol(values) => Column::new(SYMBOL_COLUMN.into(), values),
            CsvColumn::Price(name, values) => Column::new(name.into(), values),
        });
    }

    Ok(DataFrame::new(frame_columns)?)
}
