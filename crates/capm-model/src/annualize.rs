//! Annualization of the mean periodic market return.
//!
//! | returns | method     | annual return               |
//! |---------|------------|-----------------------------|
//! | simple  | arithmetic | `mean × N`                  |
//! | simple  | geometric  | `(1 + mean)^N − 1`          |
//! | log     | arithmetic | `(e^mean − 1) × N`          |
//! | log     | geometric  | `e^(mean × N) − 1`          |
//!
//! The log/arithmetic branch converts the mean log return to a simple return
//! before scaling. That mix is intentional and kept as is.

use crate::config::{AnnualizationMethod, ReturnKind};
use ndarray::ArrayView1;

/// Arithmetic mean of periodic returns, `None` when empty.
pub fn mean_return(returns: &[f64]) -> Option<f64> {
    ArrayView1::from(returns).mean()
}

/// Convert a mean periodic return into an annual return.
pub fn annualize(
    periodic_mean: f64,
    kind: ReturnKind,
    method: AnnualizationMethod,
    periods_per_year: u32,
) -> f64 {
    let n = f64::from(periods_per_year);
    match (kind, method) {
        (ReturnKind::Simple, AnnualizationMethod::Arithmetic) => periodic_mean * n,
        (ReturnKind::Simple, AnnualizationMethod::Geometric) => {
            (1.0 + periodic_mean).powf(n) - 1.0
        }
        (ReturnKind::Log, AnnualizationMethod::Arithmetic) => (periodic_mean.exp() - 1.0) * n,
        (ReturnKind::Log, AnnualizationMethod::Geometric) => (periodic_mean * n).exp() - 1.0,
    }
}
