//! Layout detection for raw price tables.

use super::layouts::{
    FieldThenSymbolAdapter, SingleSymbolAdapter, StackedAdapter, SymbolColumnsAdapter,
    SymbolThenFieldAdapter,
};
use super::{DATE_COLUMN, PriceSeries, read_dates};
use crate::error::{DataError, Result};
use crate::source::RawPrices;
use polars::prelude::*;
use tracing::debug;

/// One known shape of raw price table.
///
/// An adapter recognises its layout by inspecting column names and types, and
/// reduces it to one [`PriceSeries`] per requested symbol it can find.
pub trait PriceTableAdapter: std::fmt::Debug + Send + Sync {
    /// Short name of the layout, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether `frame` has this adapter's layout for any of `symbols`.
    fn matches(&self, frame: &DataFrame, symbols: &[String]) -> bool;

    /// Extract a series for every requested symbol present in `frame`.
    fn extract(&self, frame: &DataFrame, symbols: &[String]) -> Result<Vec<PriceSeries>>;
}

/// Series extracted from one raw table.
#[derive(Debug, Clone)]
pub struct PriceSet {
    layout: &'static str,
    series: Vec<PriceSeries>,
}

impl PriceSet {
    /// Name of the adapter that produced this set.
    pub const fn layout(&self) -> &'static str {
        self.layout
    }

    /// All extracted series.
    pub fn series(&self) -> &[PriceSeries] {
        &self.series
    }

    /// The series for `symbol`.
    pub fn get(&self, symbol: &str) -> Result<&PriceSeries> {
        self.series
            .iter()
            .find(|s| s.symbol() == symbol)
            .ok_or_else(|| DataError::MissingSymbol(symbol.to_string()))
    }
}

/// Picks the first adapter whose layout matches and runs it.
#[derive(Debug)]
pub struct PriceExtractor {
    adapters: Vec<Box<dyn PriceTableAdapter>>,
}

impl PriceExtractor {
    /// Extractor with every built-in layout, most specific first.
    pub fn new() -> Self {
        Self {
            adapters: vec![
                Box::new(StackedAdapter),
                Box::new(FieldThenSymbolAdapter),
                Box::new(SymbolThenFieldAdapter),
                Box::new(SymbolColumnsAdapter),
                Box::new(SingleSymbolAdapter),
            ],
        }
    }

    /// Append an adapter. It is tried after the ones already registered.
    pub fn with_adapter(mut self, adapter: impl PriceTableAdapter + 'static) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    /// Register an adapter ahead of every other one.
    ///
    /// The built-in `symbol-columns` and `single-symbol` layouts accept most
    /// frames with a date column, so a custom layout that overlaps them must
    /// be registered here to be chosen.
    pub fn with_priority_adapter(mut self, adapter: impl PriceTableAdapter + 'static) -> Self {
        self.adapters.insert(0, Box::new(adapter));
        self
    }

    /// Registered adapter names, in the order they are tried.
    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Reduce `raw` to per-symbol series.
    ///
    /// Fails when the input is empty, lacks a date column, matches no known
    /// layout, or the matching layout yields no series.
    pub fn extract(&self, raw: &RawPrices, symbols: &[String]) -> Result<PriceSet> {
        if raw.is_empty() {
            return Err(DataError::Extraction("price table is empty".to_string()));
        }

        let frame = raw.to_frame()?;
        if frame.column(DATE_COLUMN).is_err() {
            return Err(DataError::Extraction(format!(
                "price table has no '{DATE_COLUMN}' column"
            )));
        }

        let adapter = self
            .adapters
            .iter()
            .find(|a| a.matches(&frame, symbols))
            .ok_or_else(|| {
                DataError::Extraction(format!(
                    "no recognisable price column among {:?}",
                    column_names(&frame)
                ))
            })?;

        debug!(layout = adapter.name(), rows = frame.height(), "Extracting prices");
        let series = adapter.extract(&frame, symbols)?;
        if series.is_empty() {
            return Err(DataError::Extraction(format!(
                "{} layout yielded no price series",
                adapter.name()
            )));
        }

        Ok(PriceSet {
            layout: adapter.name(),
            series,
        })
    }
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Characters separating the two levels of a flattened column header.
pub(crate) const HIERARCHY_SEPARATORS: [char; 4] = ['_', '.', '|', ':'];

/// Preference rank of a price field name: adjusted close first, plain close second.
pub(crate) fn price_field_rank(name: &str) -> Option<u8> {
    let normalized: String = name
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect();
    match normalized.as_str() {
        "adjclose" | "adjustedclose" => Some(0),
        "close" => Some(1),
        _ => None,
    }
}

pub(crate) const fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::UInt64
            | DataType::UInt32
    )
}

pub(crate) fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Numeric columns other than the date column.
pub(crate) fn numeric_columns(frame: &DataFrame) -> Vec<String> {
    frame
        .get_columns()
        .iter()
        .filter(|c| c.name().as_str() != DATE_COLUMN && is_numeric(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

/// Build a series for `symbol` from the date column and `price_column` of `frame`.
///
/// Rows with a null date are skipped.
pub(crate) fn series_from_column(
    frame: &DataFrame,
    symbol: &str,
    price_column: &str,
) -> Result<PriceSeries> {
    let dates = read_dates(frame)?;
    let prices = frame.column(price_column)?.cast(&DataType::Float64)?;
    let prices = prices.f64()?;

    let observations = dates
        .into_iter()
        .zip(prices.into_iter())
        .filter_map(|(date, price)| date.map(|d| (d, price)));

    Ok(PriceSeries::new(symbol, observations))
}
