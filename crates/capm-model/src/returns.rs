//! Periodic returns from aligned prices.

use crate::config::ReturnKind;
use crate::error::{CapmError, Result};
use capm_data::{
    AlignedPrices, BENCHMARK_COLUMN, DATE_COLUMN, Result as DataResult, STOCK_COLUMN, read_dates,
};
use chrono::NaiveDate;
use polars::prelude::*;

/// Fewest return observations a regression will run on.
pub const MIN_OBSERVATIONS: usize = 2;

/// Stock return column of the returns frame.
pub const STOCK_RETURN_COLUMN: &str = "stock_return";

/// Market return column of the returns frame.
pub const MARKET_RETURN_COLUMN: &str = "market_return";

/// Return of `price_column` over the previous row; null on the first row.
pub fn return_expr(price_column: &str, kind: ReturnKind) -> Expr {
    let ratio = col(price_column) / col(price_column).shift(lit(1));
    match kind {
        ReturnKind::Simple => ratio - lit(1.0),
        ReturnKind::Log => ratio.log(std::f64::consts::E),
    }
}

/// Stock and market returns over the same periods.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPairs {
    /// Date closing each period.
    pub dates: Vec<NaiveDate>,
    /// Stock returns.
    pub stock: Vec<f64>,
    /// Market (benchmark) returns.
    pub market: Vec<f64>,
}

impl ReturnPairs {
    /// Number of return observations.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether there are no observations.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn from_frame(frame: &DataFrame) -> DataResult<Self> {
        let dates = read_dates(frame)?.into_iter().flatten().collect();
        let stock = frame
            .column(STOCK_RETURN_COLUMN)?
            .f64()?
            .into_no_null_iter()
            .collect();
        let market = frame
            .column(MARKET_RETURN_COLUMN)?
            .f64()?
            .into_no_null_iter()
            .collect();
        Ok(Self {
            dates,
            stock,
            market,
        })
    }
}

/// Returns frame of `date`, [`STOCK_RETURN_COLUMN`] and [`MARKET_RETURN_COLUMN`].
///
/// The first row has no prior price and is dropped, as is any period whose
/// return is not finite in either column.
pub fn returns_frame(aligned: &AlignedPrices, kind: ReturnKind) -> DataResult<LazyFrame> {
    Ok(aligned
        .to_frame()?
        .lazy()
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .select([
            col(DATE_COLUMN),
            return_expr(STOCK_COLUMN, kind).alias(STOCK_RETURN_COLUMN),
            return_expr(BENCHMARK_COLUMN, kind).alias(MARKET_RETURN_COLUMN),
        ])
        .filter(
            col(STOCK_RETURN_COLUMN)
                .is_finite()
                .and(col(MARKET_RETURN_COLUMN).is_finite()),
        ))
}

fn collect_pairs(aligned: &AlignedPrices, kind: ReturnKind) -> DataResult<ReturnPairs> {
    let frame = returns_frame(aligned, kind)?.collect()?;
    ReturnPairs::from_frame(&frame)
}

/// Returns of both aligned series.
///
/// Fails with [`CapmError::InsufficientObservations`] when fewer than
/// [`MIN_OBSERVATIONS`] pairs remain after [`returns_frame`].
pub fn compute_returns(aligned: &AlignedPrices, kind: ReturnKind) -> Result<ReturnPairs> {
    let pairs = collect_pairs(aligned, kind).map_err(CapmError::PriceExtraction)?;

    if pairs.len() < MIN_OBSERVATIONS {
        return Err(CapmError::InsufficientObservations {
            required: MIN_OBSERVATIONS,
            found: pairs.len(),
        });
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use approx::assert_relative_eq;

    fn aligned(stock: &[f64], benchmark: &[f64]) -> AlignedPrices {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        AlignedPrices {
            stock_symbol: "AAPL".to_string(),
            benchmark_symbol: "SPY".to_string(),
            dates: (0..stock.len() as u64)
                .map(|d| start + chrono::Days::new(d))
                .collect(),
            stock: stock.to_vec(),
            benchmark: benchmark.to_vec(),
        }
    }

    #[test]
    fn test_simple_returns() {
        let prices = aligned(&[100.0, 102.0, 101.0, 105.0], &[10.0, 10.1, 10.0, 10.2]);
        let r = compute_returns(&prices, ReturnKind::Simple).unwrap().stock;
        assert_eq!(r.len(), 3);
        assert_relative_eq!(r[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(r[1], -1.0 / 102.0, epsilon = 1e-12);
        assert_relative_eq!(r[2], 4.0 / 101.0, epsilon = 1e-12);
    }

    #[test]
    fn test_log_returns() {
        let prices = aligned(&[100.0, 110.0, 99.0], &[10.0, 10.1, 10.0]);
        let pairs = compute_returns(&prices, ReturnKind::Log).unwrap();
        assert_relative_eq!(pairs.stock[0], 1.1_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(pairs.stock[1], 0.9_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(pairs.market[1], (10.0_f64 / 10.1).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_constant_growth_gives_constant_returns() {
        let rate: f64 = 0.01;
        let prices: Vec<f64> = (0..20).map(|i| 50.0 * (1.0 + rate).powi(i)).collect();
        let pairs = compute_returns(&aligned(&prices, &prices), ReturnKind::Simple).unwrap();
        assert_eq!(pairs.len(), 19);
        for r in pairs.stock {
            assert_relative_eq!(r, rate, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_returns_frame_columns() {
        let prices = aligned(&[100.0, 102.0, 101.0], &[10.0, 10.1, 10.0]);
        let frame = returns_frame(&prices, ReturnKind::Simple)
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(
            frame.get_column_names(),
            vec![DATE_COLUMN, STOCK_RETURN_COLUMN, MARKET_RETURN_COLUMN]
        );
        assert_eq!(frame.height(), 2);
    }

    #[test]
    fn test_non_finite_returns_dropped() {
        let prices = aligned(&[100.0, 0.0, 101.0, 102.0, 103.0], &[10.0, 10.1, 10.0, 10.2, 10.3]);
        let pairs = compute_returns(&prices, ReturnKind::Simple).unwrap();
        // 0 -> 101 is infinite
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.dates[0], prices.dates[1]);
    }

    #[test]
    fn test_compute_returns_keeps_dates_of_period_end() {
        let prices = aligned(&[100.0, 102.0, 101.0], &[10.0, 10.1, 10.0]);
        let pairs = compute_returns(&prices, ReturnKind::Simple).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.dates, prices.dates[1..].to_vec());
    }

    #[test]
    fn test_single_return_is_insufficient() {
        let prices = aligned(&[100.0, 102.0], &[10.0, 10.1]);
        let err = compute_returns(&prices, ReturnKind::Simple).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InsufficientObservations);
        assert!(matches!(
            err,
            CapmError::InsufficientObservations { found: 1, .. }
        ));
    }

    #[test]
    fn test_single_price_is_insufficient() {
        let prices = aligned(&[100.0], &[10.0]);
        let err = compute_returns(&prices, ReturnKind::Log).unwrap_err();
        assert!(matches!(
            err,
            CapmError::InsufficientObservations { found: 0, .. }
        ));
    }
}
