//! Estimation parameters.

use crate::error::{CapmError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading periods per year for daily data.
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

/// How the mean periodic market return is scaled to a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnualizationMethod {
    /// Linear scaling by the number of periods
    #[default]
    Arithmetic,
    /// Compounding over the number of periods
    Geometric,
}

impl AnnualizationMethod {
    /// Lower-case name, as accepted by [`FromStr`].
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::Geometric => "geometric",
        }
    }
}

impl FromStr for AnnualizationMethod {
    type Err = CapmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arithmetic" => Ok(Self::Arithmetic),
            "geometric" => Ok(Self::Geometric),
            other => Err(CapmError::InvalidParameter(format!(
                "annualization method must be 'arithmetic' or 'geometric', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for AnnualizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Periodic return convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    /// `(P_i - P_{i-1}) / P_{i-1}`
    #[default]
    Simple,
    /// `ln(P_i / P_{i-1})`
    Log,
}

impl ReturnKind {
    /// `Log` when `use_log_returns` is set, `Simple` otherwise.
    pub const fn from_log_flag(use_log_returns: bool) -> Self {
        if use_log_returns { Self::Log } else { Self::Simple }
    }
}

/// Pipeline configuration shared by every estimate an estimator runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapmConfig {
    /// Return periods per year (default: 252 trading days)
    pub periods_per_year: u32,
    /// Use log returns instead of simple returns (default: false)
    pub use_log_returns: bool,
    /// Annualization of the market return (default: arithmetic)
    pub annualization: AnnualizationMethod,
    /// Report each stage through `tracing` (default: true)
    pub verbose: bool,
}

impl Default for CapmConfig {
    fn default() -> Self {
        Self {
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            use_log_returns: false,
            annualization: AnnualizationMethod::Arithmetic,
            verbose: true,
        }
    }
}

impl CapmConfig {
    /// Set the number of return periods per year.
    pub const fn with_periods_per_year(mut self, periods_per_year: u32) -> Self {
        self.periods_per_year = periods_per_year;
        self
    }

    /// Choose log or simple returns.
    pub const fn with_log_returns(mut self, use_log_returns: bool) -> Self {
        self.use_log_returns = use_log_returns;
        self
    }

    /// Set the annualization method.
    pub const fn with_annualization(mut self, annualization: AnnualizationMethod) -> Self {
        self.annualization = annualization;
        self
    }

    /// Enable or disable stage diagnostics.
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Return convention implied by `use_log_returns`.
    pub const fn return_kind(&self) -> ReturnKind {
        ReturnKind::from_log_flag(self.use_log_returns)
    }

    /// Reject out-of-domain settings.
    pub fn validate(&self) -> Result<()> {
        if self.periods_per_year == 0 {
            return Err(CapmError::InvalidParameter(
                "periods per year must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// What to estimate: a security, its benchmark, a date range and a risk-free rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapmRequest {
    /// Security symbol
    pub ticker: String,
    /// Market benchmark symbol
    pub benchmark: String,
    /// First date of the history (inclusive)
    pub start: NaiveDate,
    /// End of the history (exclusive)
    pub end: NaiveDate,
    /// Annual risk-free rate as a decimal (0.04 for 4%)
    pub risk_free_rate: f64,
}

impl CapmRequest {
    /// Create a request.
    pub fn new(
        ticker: impl Into<String>,
        benchmark: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        risk_free_rate: f64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            benchmark: benchmark.into(),
            start,
            end,
            risk_free_rate,
        }
    }

    /// Symbols to fetch, ticker first.
    pub fn symbols(&self) -> Vec<String> {
        vec![self.ticker.clone(), self.benchmark.clone()]
    }

    /// Reject empty symbols, an empty date range and a non-finite rate.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() || self.benchmark.trim().is_empty() {
            return Err(CapmError::InvalidParameter(
                "ticker and benchmark must be non-empty".to_string(),
            ));
        }
        if self.start >= self.end {
            return Err(CapmError::InvalidParameter(format!(
                "start {} must be before end {}",
                self.start, self.end
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(CapmError::InvalidParameter(format!(
                "risk-free rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = CapmConfig::default();
        assert_eq!(config.periods_per_year, 252);
        assert!(!config.use_log_returns);
        assert_eq!(config.annualization, AnnualizationMethod::Arithmetic);
        assert!(config.verbose);
        assert_eq!(config.return_kind(), ReturnKind::Simple);
    }

    #[test]
    fn test_config_builders() {
        let config = CapmConfig::default()
            .with_periods_per_year(12)
            .with_log_returns(true)
            .with_annualization(AnnualizationMethod::Geometric)
            .with_verbose(false);
        assert_eq!(config.periods_per_year, 12);
        assert_eq!(config.return_kind(), ReturnKind::Log);
        assert_eq!(config.annualization, AnnualizationMethod::Geometric);
        assert!(!config.verbose);
    }

    #[test]
    fn test_zero_periods_rejected() {
        let err = CapmConfig::default()
            .with_periods_per_year(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidParameter);
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: CapmConfig = serde_json::from_str(r#"{"annualization":"geometric"}"#).unwrap();
        assert_eq!(config.annualization, AnnualizationMethod::Geometric);
        assert_eq!(config.periods_per_year, 252);
    }

    #[rstest]
    #[case("arithmetic", AnnualizationMethod::Arithmetic)]
    #[case("geometric", AnnualizationMethod::Geometric)]
    #[case(" Geometric ", AnnualizationMethod::Geometric)]
    fn test_method_parse(#[case] input: &str, #[case] expected: AnnualizationMethod) {
        assert_eq!(input.parse::<AnnualizationMethod>().unwrap(), expected);
    }

    #[rstest]
    #[case("quarterly")]
    #[case("")]
    #[case("log")]
    fn test_unknown_method_rejected(#[case] input: &str) {
        let err = input.parse::<AnnualizationMethod>().unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidParameter);
    }

    #[test]
    fn test_request_validation() {
        let ok = CapmRequest::new("MSFT", "^GSPC", date(2023, 1, 1), date(2024, 1, 1), 0.04);
        assert!(ok.validate().is_ok());
        assert_eq!(ok.symbols(), vec!["MSFT".to_string(), "^GSPC".to_string()]);

        let empty = CapmRequest::new(" ", "^GSPC", date(2023, 1, 1), date(2024, 1, 1), 0.04);
        assert!(empty.validate().is_err());

        let backwards = CapmRequest::new("MSFT", "^GSPC", date(2024, 1, 1), date(2024, 1, 1), 0.04);
        assert!(backwards.validate().is_err());

        let nan_rate =
            CapmRequest::new("MSFT", "^GSPC", date(2023, 1, 1), date(2024, 1, 1), f64::NAN);
        assert!(nan_rate.validate().is_err());
    }
}
