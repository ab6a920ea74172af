//! The estimation pipeline.
//!
//! `fetch → extract → align → returns → regress → annualize → compose`.
//! Any stage failing ends the run with that stage's [`CapmError`].

use crate::annualize::{annualize, mean_return};
use crate::capm::{CapmResult, compose};
use crate::config::{CapmConfig, CapmRequest};
use crate::error::{CapmError, Result};
use crate::regression::linear_regression;
use crate::returns::{MIN_OBSERVATIONS, compute_returns};
use capm_data::{DataError, PriceExtractor, PriceSource, RawPrices, align};
use tracing::{info, warn};

/// Runs CAPM estimates against one price source.
#[derive(Debug)]
pub struct CapmEstimator<S> {
    source: S,
    config: CapmConfig,
    extractor: PriceExtractor,
}

impl<S> CapmEstimator<S> {
    /// Estimator over `source` with the built-in table layouts.
    pub fn new(source: S, config: CapmConfig) -> Self {
        Self {
            source,
            config,
            extractor: PriceExtractor::new(),
        }
    }

    /// Replace the price extractor, e.g. to register extra layouts.
    pub fn with_extractor(mut self, extractor: PriceExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Active configuration.
    pub const fn config(&self) -> &CapmConfig {
        &self.config
    }

    /// Estimate from prices already in hand, skipping the fetch.
    pub fn estimate_from_prices(
        &self,
        request: &CapmRequest,
        raw: &RawPrices,
    ) -> Result<CapmResult> {
        let outcome = self.validate(request).and_then(|()| self.compute(request, raw));
        self.finish(request, outcome)
    }

    fn validate(&self, request: &CapmRequest) -> Result<()> {
        self.config.validate()?;
        request.validate()
    }

    fn compute(&self, request: &CapmRequest, raw: &RawPrices) -> Result<CapmResult> {
        let verbose = self.config.verbose;
        let kind = self.config.return_kind();

        let prices = self
            .extractor
            .extract(raw, &request.symbols())
            .map_err(CapmError::PriceExtraction)?;
        let stock = prices
            .get(&request.ticker)
            .map_err(CapmError::PriceExtraction)?;
        let market = prices
            .get(&request.benchmark)
            .map_err(CapmError::PriceExtraction)?;

        let aligned = align(stock, market).map_err(CapmError::PriceExtraction)?;
        if verbose {
            info!(
                layout = prices.layout(),
                stock_rows = stock.len(),
                benchmark_rows = market.len(),
                aligned_rows = aligned.len(),
                "Extracted adjusted close prices"
            );
        }

        let returns = compute_returns(&aligned, kind)?;
        if verbose {
            info!(observations = returns.len(), ?kind, "Computed returns");
        }

        let fit = linear_regression(&returns.market, &returns.stock)?;
        if verbose {
            info!(
                beta = fit.slope,
                alpha = fit.intercept,
                r_squared = fit.r_squared(),
                beta_stderr = fit.stderr,
                "Fitted regression"
            );
        }

        let periodic_mean =
            mean_return(&returns.market).ok_or(CapmError::InsufficientObservations {
                required: MIN_OBSERVATIONS,
                found: 0,
            })?;
        let market_annual_return = annualize(
            periodic_mean,
            kind,
            self.config.annualization,
            self.config.periods_per_year,
        );
        if verbose {
            info!(
                periodic_mean,
                market_annual_return,
                method = %self.config.annualization,
                periods_per_year = self.config.periods_per_year,
                "Annualized market return"
            );
        }

        Ok(compose(request.risk_free_rate, &fit, market_annual_return))
    }

    fn finish(&self, request: &CapmRequest, outcome: Result<CapmResult>) -> Result<CapmResult> {
        if self.config.verbose {
            match &outcome {
                Ok(result) => info!(
                    ticker = %request.ticker,
                    benchmark = %request.benchmark,
                    risk_free_rate = request.risk_free_rate,
                    expected_return = result.expected_return(),
                    market_risk_premium = result.market_risk_premium(),
                    "CAPM estimate complete"
                ),
                Err(e) => warn!(
                    ticker = %request.ticker,
                    benchmark = %request.benchmark,
                    reason = %e.kind(),
                    "CAPM estimate failed: {e}"
                ),
            }
        }
        outcome
    }
}

impl<S: PriceSource> CapmEstimator<S> {
    /// Fetch prices for the request and estimate.
    pub async fn estimate(&self, request: &CapmRequest) -> Result<CapmResult> {
        let outcome = self
            .fetch(request)
            .await
            .and_then(|raw| self.compute(request, &raw));
        self.finish(request, outcome)
    }

    async fn fetch(&self, request: &CapmRequest) -> Result<RawPrices> {
        self.validate(request)?;
        if self.config.verbose {
            info!(
                "Fetching data for {} and {} from {} to {}",
                request.ticker, request.benchmark, request.start, request.end
            );
        }

        let raw = self
            .source
            .fetch(&request.symbols(), request.start, request.end)
            .await
            .map_err(CapmError::DataFetch)?;

        if raw.is_empty() {
            return Err(CapmError::DataFetch(DataError::MissingData {
                symbol: request.symbols().join(","),
                reason: "No data returned from source".to_string(),
            }));
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnualizationMethod;
    use crate::error::FailureKind;
    use approx::assert_relative_eq;
    use capm_data::FramePriceSource;
    use chrono::NaiveDate;
    use polars::prelude::*;

    fn request() -> CapmRequest {
        CapmRequest::new(
            "MSFT",
            "^GSPC",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            0.04,
        )
    }

    fn frame(stock: Vec<Option<f64>>, market: Vec<Option<f64>>) -> DataFrame {
        let days: Vec<i32> = (0..stock.len() as i32).map(|d| 19_725 + d).collect();
        DataFrame::new(vec![
            Column::new("date".into(), days).cast(&DataType::Date).unwrap(),
            Column::new("MSFT".into(), stock),
            Column::new("^GSPC".into(), market),
        ])
        .unwrap()
    }

    fn quiet() -> CapmConfig {
        CapmConfig::default().with_verbose(false)
    }

    #[test]
    fn test_estimate_from_prices() {
        let raw = RawPrices::Table(frame(
            vec![Some(100.0), Some(102.0), Some(101.0), Some(105.0)],
            vec![Some(100.0), Some(101.0), Some(100.5), Some(103.0)],
        ));
        let estimator = CapmEstimator::new((), quiet());

        let result = estimator.estimate_from_prices(&request(), &raw).unwrap();
        assert_eq!(result.n_obs(), 3);
        assert!(result.beta() > 0.0);
        assert_relative_eq!(
            result.expected_return(),
            0.04 + result.beta() * (result.market_annual_return() - 0.04),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_rows_dropped_before_returns() {
        let raw = RawPrices::Table(frame(
            vec![Some(100.0), None, Some(101.0), Some(105.0), Some(104.0)],
            vec![Some(100.0), Some(101.0), Some(100.5), Some(103.0), Some(102.0)],
        ));
        let result = CapmEstimator::new((), quiet())
            .estimate_from_prices(&request(), &raw)
            .unwrap();
        assert_eq!(result.n_obs(), 3);
    }

    #[test]
    fn test_zero_variance_market() {
        let raw = RawPrices::Table(frame(
            vec![Some(100.0), Some(102.0), Some(101.0)],
            vec![Some(50.0), Some(50.0), Some(50.0)],
        ));
        let err = CapmEstimator::new((), quiet())
            .estimate_from_prices(&request(), &raw)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::DegenerateMarketVariance);
    }

    #[test]
    fn test_single_day_is_insufficient() {
        let raw = RawPrices::Table(frame(vec![Some(100.0)], vec![Some(50.0)]));
        let err = CapmEstimator::new((), quiet())
            .estimate_from_prices(&request(), &raw)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InsufficientObservations);
    }

    #[test]
    fn test_missing_benchmark_is_extraction_failure() {
        let days: Vec<i32> = vec![19_725, 19_726, 19_727];
        let raw = RawPrices::Table(
            DataFrame::new(vec![
                Column::new("date".into(), days).cast(&DataType::Date).unwrap(),
                Column::new("MSFT".into(), vec![1.0, 2.0, 3.0]),
            ])
            .unwrap(),
        );
        let err = CapmEstimator::new((), quiet())
            .estimate_from_prices(&request(), &raw)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::PriceExtraction);
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let raw = RawPrices::Table(DataFrame::empty());
        let err = CapmEstimator::new((), quiet().with_periods_per_year(0))
            .estimate_from_prices(&request(), &raw)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidParameter);
    }

    #[tokio::test]
    async fn test_empty_source_is_fetch_failure() {
        let source = FramePriceSource::new(DataFrame::empty());
        let err = CapmEstimator::new(source, quiet())
            .estimate(&request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::DataFetch);
    }

    #[tokio::test]
    async fn test_estimate_with_geometric_annualization() {
        let source = FramePriceSource::new(frame(
            vec![Some(100.0), Some(102.0), Some(101.0), Some(105.0)],
            vec![Some(100.0), Some(101.0), Some(100.5), Some(103.0)],
        ));
        let config = quiet().with_annualization(AnnualizationMethod::Geometric);
        let result = CapmEstimator::new(source, config)
            .estimate(&request())
            .await
            .unwrap();

        let market = [0.01, -0.5 / 101.0, 2.5 / 100.5];
        let mean = market.iter().sum::<f64>() / 3.0;
        assert_relative_eq!(
            result.market_annual_return(),
            (1.0 + mean).powf(252.0) - 1.0,
            max_relative = 1e-9
        );
    }
}
