//! Failure reasons for a CAPM estimate.

use capm_data::DataError;
use std::fmt;
use thiserror::Error;

/// Result type for CAPM operations.
pub type Result<T> = std::result::Result<T, CapmError>;

/// Why an estimate could not be produced.
#[derive(Debug, Error)]
pub enum CapmError {
    /// Source unreachable, symbol unknown, or empty response
    #[error("Data fetch failed: {0}")]
    DataFetch(#[source] DataError),

    /// No adjusted-close field found, or a requested symbol is absent
    #[error("Price extraction failed: {0}")]
    PriceExtraction(#[source] DataError),

    /// Too few aligned, non-missing return pairs
    #[error("Insufficient observations: need at least {required}, got {found}")]
    InsufficientObservations {
        /// Minimum number of observations
        required: usize,
        /// Observations available
        found: usize,
    },

    /// Benchmark returns are constant, so beta is undefined
    #[error("Market returns have zero variance; beta is undefined")]
    DegenerateMarketVariance,

    /// Unrecognised or out-of-domain input
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl CapmError {
    /// The failure category, without its payload.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::DataFetch(_) => FailureKind::DataFetch,
            Self::PriceExtraction(_) => FailureKind::PriceExtraction,
            Self::InsufficientObservations { .. } => FailureKind::InsufficientObservations,
            Self::DegenerateMarketVariance => FailureKind::DegenerateMarketVariance,
            Self::InvalidParameter(_) => FailureKind::InvalidParameter,
        }
    }
}

/// Fieldless tag for [`CapmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// See [`CapmError::DataFetch`].
    DataFetch,
    /// See [`CapmError::PriceExtraction`].
    PriceExtraction,
    /// See [`CapmError::InsufficientObservations`].
    InsufficientObservations,
    /// See [`CapmError::DegenerateMarketVariance`].
    DegenerateMarketVariance,
    /// See [`CapmError::InvalidParameter`].
    InvalidParameter,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataFetch => "data_fetch",
            Self::PriceExtraction => "price_extraction",
            Self::InsufficientObservations => "insufficient_observations",
            Self::DegenerateMarketVariance => "degenerate_market_variance",
            Self::InvalidParameter => "invalid_parameter",
        };
        f.write_str(name)
    }
}
