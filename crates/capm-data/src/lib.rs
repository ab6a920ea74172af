#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod local;
pub mod prices;
pub mod source;
pub mod yahoo;

pub use error::{DataError, Result};
pub use local::{CsvPriceSource, FramePriceSource};
pub use prices::{
    AlignedPrices, BENCHMARK_COLUMN, DATE_COLUMN, PriceExtractor, PriceSeries, PriceSet,
    PriceTableAdapter, STOCK_COLUMN, align, read_dates,
};
pub use source::{PriceSource, RawPrices};
pub use yahoo::YahooQuoteProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
