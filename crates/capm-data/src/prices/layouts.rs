//! Built-in price table layouts.

use super::adapter::{
    HIERARCHY_SEPARATORS, PriceTableAdapter, is_numeric, numeric_columns, price_field_rank,
    series_from_column,
};
use super::{PriceSeries, SYMBOL_COLUMN};
use crate::error::{DataError, Result};
use polars::prelude::*;

/// Long format: a `symbol` column plus a price field column, one row per
/// (symbol, date). This is what [`YahooQuoteProvider`](crate::YahooQuoteProvider)
/// produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackedAdapter;

impl StackedAdapter {
    fn price_column(frame: &DataFrame) -> Option<String> {
        frame
            .get_columns()
            .iter()
            .filter(|c| is_numeric(c.dtype()))
            .filter_map(|c| price_field_rank(c.name()).map(|rank| (rank, c.name().to_string())))
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, name)| name)
    }
}

impl PriceTableAdapter for StackedAdapter {
    fn name(&self) -> &'static str {
        "stacked"
    }

    fn matches(&self, frame: &DataFrame, _symbols: &[String]) -> bool {
        frame.column(SYMBOL_COLUMN).is_ok() && Self::price_column(frame).is_some()
    }

    fn extract(&self, frame: &DataFrame, symbols: &[String]) -> Result<Vec<PriceSeries>> {
        let field = Self::price_column(frame)
            .ok_or_else(|| DataError::Extraction("stacked table has no price field".to_string()))?;

        let mut out = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let rows = frame
                .clone()
                .lazy()
                .filter(col(SYMBOL_COLUMN).eq(lit(symbol.as_str())))
                .collect()?;
            if rows.height() > 0 {
                out.push(series_from_column(&rows, symbol, &field)?);
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy)]
enum HeaderOrder {
    FieldFirst,
    SymbolFirst,
}

impl HeaderOrder {
    /// The field half of `header` when the other half is `symbol`.
    fn field<'a>(self, header: &'a str, symbol: &str) -> Option<&'a str> {
        match self {
            Self::FieldFirst => header
                .strip_suffix(symbol)?
                .strip_suffix(HIERARCHY_SEPARATORS),
            Self::SymbolFirst => header
                .strip_prefix(symbol)?
                .strip_prefix(HIERARCHY_SEPARATORS),
        }
    }

    /// Best price column per symbol, as `(symbol, column)` pairs.
    fn columns(self, frame: &DataFrame, symbols: &[String]) -> Vec<(String, String)> {
        let headers = numeric_columns(frame);
        symbols
            .iter()
            .filter_map(|symbol| {
                headers
                    .iter()
                    .filter_map(|header| {
                        let rank = price_field_rank(self.field(header, symbol)?)?;
                        Some((rank, header))
                    })
                    .min_by_key(|(rank, _)| *rank)
                    .map(|(_, header)| (symbol.clone(), header.clone()))
            })
            .collect()
    }

    fn extract(self, frame: &DataFrame, symbols: &[String]) -> Result<Vec<PriceSeries>> {
        self.columns(frame, symbols)
            .into_iter()
            .map(|(symbol, header)| series_from_column(frame, &symbol, &header))
            .collect()
    }
}

/// Flattened two-level headers keyed field first, e.g. `Adj Close_MSFT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldThenSymbolAdapter;

impl PriceTableAdapter for FieldThenSymbolAdapter {
    fn name(&self) -> &'static str {
        "field-then-symbol"
    }

    fn matches(&self, frame: &DataFrame, symbols: &[String]) -> bool {
        !HeaderOrder::FieldFirst.columns(frame, symbols).is_empty()
    }

    fn extract(&self, frame: &DataFrame, symbols: &[String]) -> Result<Vec<PriceSeries>> {
        HeaderOrder::FieldFirst.extract(frame, symbols)
    }
}

/// Flattened two-level headers keyed symbol first, e.g. `MSFT.adjusted_close`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolThenFieldAdapter;

impl PriceTableAdapter for SymbolThenFieldAdapter {
    fn name(&self) -> &'static str {
        "symbol-then-field"
    }

    fn matches(&self, frame: &DataFrame, symbols: &[String]) -> bool {
        !HeaderOrder::SymbolFirst.columns(frame, symbols).is_empty()
    }

    fn extract(&self, frame: &DataFrame, symbols: &[String]) -> Result<Vec<PriceSeries>> {
        HeaderOrder::SymbolFirst.extract(frame, symbols)
    }
}

/// One adjusted-close column per symbol, named by the symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolColumnsAdapter;

impl PriceTableAdapter for SymbolColumnsAdapter {
    fn name(&self) -> &'static str {
        "symbol-columns"
    }

    fn matches(&self, frame: &DataFrame, symbols: &[String]) -> bool {
        let headers = numeric_columns(frame);
        symbols.iter().any(|s| headers.contains(s))
    }

    fn extract(&self, frame: &DataFrame, symbols: &[String]) -> Result<Vec<PriceSeries>> {
        let headers = numeric_columns(frame);
        symbols
            .iter()
            .filter(|s| headers.contains(s))
            .map(|s| series_from_column(frame, s, s))
            .collect()
    }
}

/// Fields of a single, unlabelled symbol: the adjusted close if present,
/// otherwise the sole numeric column. Prices are attributed to the first
/// requested symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSymbolAdapter;

impl SingleSymbolAdapter {
    fn price_column(frame: &DataFrame) -> Option<String> {
        let numeric = numeric_columns(frame);
        let ranked = numeric
            .iter()
            .filter_map(|name| price_field_rank(name).map(|rank| (rank, name)))
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, name)| name.clone());

        match (ranked, numeric.as_slice()) {
            (Some(name), _) => Some(name),
            (None, [sole]) => Some(sole.clone()),
            _ => None,
        }
    }
}

impl PriceTableAdapter for SingleSymbolAdapter {
    fn name(&self) -> &'static str {
        "single-symbol"
    }

    fn matches(&self, frame: &DataFrame, _symbols: &[String]) -> bool {
        frame.column(SYMBOL_COLUMN).is_err() && Self::price_column(frame).is_some()
    }

    fn extract(&self, frame: &DataFrame, symbols: &[String]) -> Result<Vec<PriceSeries>> {
        let symbol = symbols
            .first()
            .ok_or_else(|| DataError::InvalidSymbol("no symbol requested".to_string()))?;
        let column = Self::price_column(frame)
            .ok_or_else(|| DataError::Extraction("no price field found".to_string()))?;
        Ok(vec![series_from_column(frame, symbol, &column)?])
    }
}
