#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod annualize;
pub mod capm;
pub mod config;
pub mod error;
pub mod estimator;
pub mod regression;
pub mod returns;

pub use annualize::{annualize, mean_return};
pub use capm::{CapmResult, compose};
pub use config::{
    AnnualizationMethod, CapmConfig, CapmRequest, DEFAULT_PERIODS_PER_YEAR, ReturnKind,
};
pub use error::{CapmError, FailureKind, Result};
pub use estimator::CapmEstimator;
pub use regression::{RegressionResult, linear_regression};
pub use returns::{
    MARKET_RETURN_COLUMN, MIN_OBSERVATIONS, ReturnPairs, STOCK_RETURN_COLUMN, compute_returns,
    return_expr, returns_frame,
};
