//! Canonical price series and stock/benchmark alignment.
//!
//! Every table layout a source can return is reduced to one [`PriceSeries`]
//! per symbol. Two series are then inner-joined on date by [`align`].

mod adapter;
mod layouts;

pub use adapter::{PriceExtractor, PriceSet, PriceTableAdapter};
pub use layouts::{
    FieldThenSymbolAdapter, SingleSymbolAdapter, StackedAdapter, SymbolColumnsAdapter,
    SymbolThenFieldAdapter,
};

use crate::error::{DataError, Result};
use chrono::{Duration, NaiveDate};
use polars::prelude::*;

/// Name of the date column every raw table must carry.
pub const DATE_COLUMN: &str = "date";

/// Name of the symbol column in a stacked (long) table.
pub const SYMBOL_COLUMN: &str = "symbol";

/// Stock price column of an aligned frame.
pub const STOCK_COLUMN: &str = "stock";

/// Benchmark price column of an aligned frame.
pub const BENCHMARK_COLUMN: &str = "benchmark";

/// One dated observation. `price` is `None` when the source had no usable value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    /// Trading date.
    pub date: NaiveDate,
    /// Adjusted close, if present.
    pub price: Option<f64>,
}

/// Adjusted closing prices for one symbol.
///
/// Dates are strictly increasing. Null, non-finite and non-positive prices are
/// stored as missing observations.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    /// Build a series from unordered observations.
    ///
    /// Observations are sorted by date; for a repeated date the last one wins.
    pub fn new(
        symbol: impl Into<String>,
        observations: impl IntoIterator<Item = (NaiveDate, Option<f64>)>,
    ) -> Self {
        let mut raw: Vec<(NaiveDate, Option<f64>)> = observations.into_iter().collect();
        raw.sort_by_key(|(date, _)| *date);

        let mut canonical: Vec<PriceObservation> = Vec::with_capacity(raw.len());
        for (date, price) in raw {
            let price = price.filter(|p| p.is_finite() && *p > 0.0);
            match canonical.last_mut() {
                Some(last) if last.date == date => last.price = price,
                _ => canonical.push(PriceObservation { date, price }),
            }
        }

        Self {
            symbol: symbol.into(),
            observations: canonical,
        }
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All observations in date order, including missing prices.
    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    /// Number of dated rows, including missing prices.
    pub const fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no rows.
    pub const fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of rows holding a usable price.
    pub fn valid_count(&self) -> usize {
        self.observations.iter().filter(|o| o.price.is_some()).count()
    }

    /// Two-column frame of `date` and the prices under `value_column`.
    pub fn to_frame(&self, value_column: &str) -> Result<DataFrame> {
        let prices: Vec<Option<f64>> = self.observations.iter().map(|o| o.price).collect();
        Ok(DataFrame::new(vec![
            date_column(self.observations.iter().map(|o| o.date))?,
            Column::new(value_column.into(), prices),
        ])?)
    }
}

/// Stock and benchmark prices on their common dates.
///
/// Only dates where both series hold a usable price are kept, in date order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPrices {
    /// Stock symbol.
    pub stock_symbol: String,
    /// Benchmark symbol.
    pub benchmark_symbol: String,
    /// Common dates.
    pub dates: Vec<NaiveDate>,
    /// Stock prices on `dates`.
    pub stock: Vec<f64>,
    /// Benchmark prices on `dates`.
    pub benchmark: Vec<f64>,
}

impl AlignedPrices {
    /// Number of aligned rows.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether no date survived alignment.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First and last aligned dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    /// Frame of `date`, [`STOCK_COLUMN`] and [`BENCHMARK_COLUMN`].
    pub fn to_frame(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            date_column(self.dates.iter().copied())?,
            Column::new(STOCK_COLUMN.into(), self.stock.as_slice()),
            Column::new(BENCHMARK_COLUMN.into(), self.benchmark.as_slice()),
        ])?)
    }

    fn from_frame(stock_symbol: &str, benchmark_symbol: &str, frame: &DataFrame) -> Result<Self> {
        let dates = read_dates(frame)?
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DataError::Parse("aligned prices contain a null date".to_string()))?;
        let stock = frame.column(STOCK_COLUMN)?.f64()?.into_no_null_iter().collect();
        let benchmark = frame
            .column(BENCHMARK_COLUMN)?
            .f64()?
            .into_no_null_iter()
            .collect();

        Ok(Self {
            stock_symbol: stock_symbol.to_string(),
            benchmark_symbol: benchmark_symbol.to_string(),
            dates,
            stock,
            benchmark,
        })
    }
}

/// Inner-join two series on date, keeping rows where both have a price.
pub fn align(stock: &PriceSeries, benchmark: &PriceSeries) -> Result<AlignedPrices> {
    let joined = stock
        .to_frame(STOCK_COLUMN)?
        .lazy()
        .join(
            benchmark.to_frame(BENCHMARK_COLUMN)?.lazy(),
            [col(DATE_COLUMN)],
            [col(DATE_COLUMN)],
            JoinArgs::new(JoinType::Inner),
        )
        .filter(
            col(STOCK_COLUMN)
                .is_not_null()
                .and(col(BENCHMARK_COLUMN).is_not_null()),
        )
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    AlignedPrices::from_frame(stock.symbol(), benchmark.symbol(), &joined)
}

fn epoch() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| DataError::TimeConversion("invalid epoch".to_string()))
}

/// `date` column of polars `Date` type.
fn date_column(dates: impl Iterator<Item = NaiveDate>) -> Result<Column> {
    let epoch = epoch()?;
    let days = dates
        .map(|d| i32::try_from((d - epoch).num_days()))
        .collect::<std::result::Result<Vec<i32>, _>>()
        .map_err(|e| DataError::TimeConversion(e.to_string()))?;
    Ok(Column::new(DATE_COLUMN.into(), days).cast(&DataType::Date)?)
}

/// Dates of the `date` column; `Date`, `Datetime` and ISO string columns are accepted.
pub fn read_dates(frame: &DataFrame) -> Result<Vec<Option<NaiveDate>>> {
    let column = frame.column(DATE_COLUMN)?;
    let column = match column.dtype() {
        DataType::Date => column.clone(),
        DataType::Datetime(_, _) | DataType::String => column.cast(&DataType::Date)?,
        other => {
            return Err(DataError::Parse(format!(
                "unsupported date column type: {other}"
            )));
        }
    };

    let epoch = epoch()?;
    let days = column.date()?;
    Ok((0..days.len())
        .map(|i| days.get(i).map(|d| epoch + Duration::days(i64::from(d))))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_series_sorted_and_deduplicated() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                (day(3), Some(103.0)),
                (day(1), Some(101.0)),
                (day(2), Some(99.0)),
                (day(2), Some(102.0)),
            ],
        );

        let dates: Vec<_> = series.observations().iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(series.observations()[1].price, Some(102.0));
        assert_eq!(series.symbol(), "AAPL");
    }

    #[test]
    fn test_invalid_prices_become_missing() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                (day(1), Some(f64::NAN)),
                (day(2), Some(-1.0)),
                (day(3), Some(0.0)),
                (day(4), None),
                (day(5), Some(10.0)),
            ],
        );

        assert_eq!(series.len(), 5);
        assert_eq!(series.valid_count(), 1);
    }

    #[test]
    fn test_align_intersects_dates() {
        let stock = PriceSeries::new(
            "AAPL",
            vec![(day(1), Some(1.0)), (day(2), Some(2.0)), (day(4), Some(4.0))],
        );
        let bench = PriceSeries::new(
            "SPY",
            vec![(day(2), Some(20.0)), (day(3), Some(30.0)), (day(4), Some(40.0))],
        );

        let aligned = align(&stock, &bench).unwrap();
        assert_eq!(aligned.dates, vec![day(2), day(4)]);
        assert_eq!(aligned.stock, vec![2.0, 4.0]);
        assert_eq!(aligned.benchmark, vec![20.0, 40.0]);
        assert_eq!(aligned.date_range(), Some((day(2), day(4))));
    }

    #[test]
    fn test_align_drops_rows_missing_either_price() {
        let stock = PriceSeries::new(
            "AAPL",
            vec![(day(1), Some(1.0)), (day(2), None), (day(3), Some(3.0))],
        );
        let bench = PriceSeries::new(
            "SPY",
            vec![(day(1), None), (day(2), Some(20.0)), (day(3), Some(30.0))],
        );

        let aligned = align(&stock, &bench).unwrap();
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned.dates, vec![day(3)]);
    }

    #[test]
    fn test_align_unsorted_input_in_date_order() {
        let stock = PriceSeries::new(
            "AAPL",
            vec![(day(5), Some(5.0)), (day(1), Some(1.0)), (day(3), Some(3.0))],
        );
        let bench = PriceSeries::new(
            "SPY",
            vec![(day(3), Some(30.0)), (day(5), Some(50.0)), (day(1), Some(10.0))],
        );

        let aligned = align(&stock, &bench).unwrap();
        assert_eq!(aligned.dates, vec![day(1), day(3), day(5)]);
        assert_eq!(aligned.benchmark, vec![10.0, 30.0, 50.0]);
    }

    #[test]
    fn test_align_same_series_twice() {
        let series = PriceSeries::new("SPY", vec![(day(1), Some(1.0)), (day(2), Some(2.0))]);
        let aligned = align(&series, &series).unwrap();
        assert_eq!(aligned.stock, aligned.benchmark);
        assert_eq!(aligned.len(), 2);
    }

    #[test]
    fn test_aligned_frame_columns() {
        let stock = PriceSeries::new("AAPL", vec![(day(1), Some(1.0)), (day(2), Some(2.0))]);
        let bench = PriceSeries::new("SPY", vec![(day(1), Some(3.0)), (day(2), Some(4.0))]);

        let frame = align(&stock, &bench).unwrap().to_frame().unwrap();
        assert_eq!(
            frame.get_column_names(),
            vec![DATE_COLUMN, STOCK_COLUMN, BENCHMARK_COLUMN]
        );
        assert_eq!(frame.column(DATE_COLUMN).unwrap().dtype(), &DataType::Date);
        assert_eq!(read_dates(&frame).unwrap(), vec![Some(day(1)), Some(day(2))]);
    }

    #[test]
    fn test_align_disjoint_is_empty() {
        let stock = PriceSeries::new("AAPL", vec![(day(1), Some(1.0))]);
        let bench = PriceSeries::new("SPY", vec![(day(2), Some(2.0))]);

        let aligned = align(&stock, &bench).unwrap();
        assert!(aligned.is_empty());
        assert_eq!(aligned.date_range(), None);
    }
}
