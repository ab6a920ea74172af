//! Ordinary least-squares fit of one dependent variable on one regressor.
//!
//! Closed-form single-variable OLS; no weighting, no iteration. Standard
//! errors follow the usual convention for `linregress`-style routines.

use crate::error::{CapmError, Result};
use crate::returns::MIN_OBSERVATIONS;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Fitted line `y = intercept + slope * x` with diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Slope (beta)
    pub slope: f64,
    /// Intercept (alpha)
    pub intercept: f64,
    /// Pearson correlation of x and y
    pub r_value: f64,
    /// Standard error of the slope
    pub stderr: f64,
    /// Standard error of the intercept
    pub intercept_stderr: f64,
    /// Number of observations
    pub n: usize,
}

impl RegressionResult {
    /// Coefficient of determination, the squared correlation.
    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }
}

/// Regress `y` on `x`.
///
/// # Errors
/// * [`CapmError::InvalidParameter`] if the lengths differ
/// * [`CapmError::InsufficientObservations`] for fewer than two points
/// * [`CapmError::DegenerateMarketVariance`] if `x` is constant
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<RegressionResult> {
    if x.len() != y.len() {
        return Err(CapmError::InvalidParameter(format!(
            "regression inputs differ in length: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < MIN_OBSERVATIONS {
        return Err(CapmError::InsufficientObservations {
            required: MIN_OBSERVATIONS,
            found: n,
        });
    }

    let x = ArrayView1::from(x);
    let y = ArrayView1::from(y);
    if x.iter().all(|v| *v == x[0]) {
        return Err(CapmError::DegenerateMarketVariance);
    }

    let count = n as f64;
    let x_mean = x.sum() / count;
    let y_mean = y.sum() / count;
    let dx = x.mapv(|v| v - x_mean);
    let dy = y.mapv(|v| v - y_mean);

    // Population (biased) second moments
    let ssxm = dx.dot(&dx) / count;
    let ssym = dy.dot(&dy) / count;
    let ssxym = dx.dot(&dy) / count;

    if ssxm.is_nan() || ssxm <= 0.0 {
        return Err(CapmError::DegenerateMarketVariance);
    }

    let r_value = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };

    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;

    // Two points fit exactly and leave no degrees of freedom.
    let (stderr, intercept_stderr) = if n == 2 {
        (0.0, 0.0)
    } else {
        let df = (n - 2) as f64;
        let stderr = ((1.0 - r_value * r_value) * ssym / ssxm / df).sqrt();
        (stderr, stderr * (ssxm + x_mean * x_mean).sqrt())
    };

    Ok(RegressionResult {
        slope,
        intercept,
        r_value,
        stderr,
        intercept_stderr,
        n,
    })
}
