//! CAPM composition: `E(R) = Rf + β · (E(Rm) − Rf)`.

use crate::regression::RegressionResult;
use serde::Serialize;

/// A completed CAPM estimate.
///
/// Built only by [`compose`]; fields are read through accessors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapmResult {
    expected_return: f64,
    beta: f64,
    alpha: f64,
    beta_stderr: f64,
    r_squared: f64,
    market_annual_return: f64,
    market_risk_premium: f64,
    n_obs: usize,
}

impl CapmResult {
    /// Annual expected return (cost of equity).
    pub const fn expected_return(&self) -> f64 {
        self.expected_return
    }

    /// Regression slope of stock on market returns.
    pub const fn beta(&self) -> f64 {
        self.beta
    }

    /// Regression intercept, per period.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Standard error of beta.
    pub const fn beta_stderr(&self) -> f64 {
        self.beta_stderr
    }

    /// Squared correlation of stock and market returns.
    pub const fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Annualized market return.
    pub const fn market_annual_return(&self) -> f64 {
        self.market_annual_return
    }

    /// Annualized market return minus the risk-free rate.
    pub const fn market_risk_premium(&self) -> f64 {
        self.market_risk_premium
    }

    /// Return observations used in the regression.
    pub const fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Beta divided by its standard error, when the error is positive.
    pub fn beta_t_stat(&self) -> Option<f64> {
        (self.beta_stderr > 0.0).then(|| self.beta / self.beta_stderr)
    }
}

/// Apply the CAPM formula to a fitted regression.
#[must_use]
pub fn compose(
    risk_free_rate: f64,
    regression: &RegressionResult,
    market_annual_return: f64,
) -> CapmResult {
    let market_risk_premium = market_annual_return - risk_free_rate;
    CapmResult {
        expected_return: risk_free_rate + regression.slope * market_risk_premium,
        beta: regression.slope,
        alpha: regression.intercept,
        beta_stderr: regression.stderr,
        r_squared: regression.r_squared(),
        market_annual_return,
        market_risk_premium,
        n_obs: regression.n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fit(slope: f64, stderr: f64) -> RegressionResult {
        RegressionResult {
            slope,
            intercept: 0.0002,
            r_value: 0.8,
            stderr,
            intercept_stderr: 0.0001,
            n: 250,
        }
    }

    #[test]
    fn test_compose() {
        let result = compose(0.04, &fit(1.2, 0.05), 0.10);

        assert_relative_eq!(result.market_risk_premium(), 0.06, epsilon = 1e-12);
        assert_relative_eq!(result.expected_return(), 0.04 + 1.2 * 0.06, epsilon = 1e-12);
        assert_relative_eq!(result.r_squared(), 0.64, epsilon = 1e-12);
        assert_eq!(result.beta(), 1.2);
        assert_eq!(result.alpha(), 0.0002);
        assert_eq!(result.beta_stderr(), 0.05);
        assert_eq!(result.market_annual_return(), 0.10);
        assert_eq!(result.n_obs(), 250);
    }

    #[test]
    fn test_zero_beta_earns_risk_free() {
        let result = compose(0.035, &fit(0.0, 0.1), 0.12);
        assert_relative_eq!(result.expected_return(), 0.035);
    }

    #[test]
    fn test_beta_t_stat() {
        assert_relative_eq!(compose(0.0, &fit(1.2, 0.05), 0.1).beta_t_stat().unwrap(), 24.0);
        assert_eq!(compose(0.0, &fit(1.2, 0.0), 0.1).beta_t_stat(), None);
    }

    #[test]
    fn test_serializes_all_fields() {
        let json = serde_json::to_value(compose(0.04, &fit(1.0, 0.1), 0.1)).unwrap();
        for key in [
            "expected_return",
            "beta",
            "alpha",
            "beta_stderr",
            "r_squared",
            "market_annual_return",
            "market_risk_premium",
            "n_obs",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
