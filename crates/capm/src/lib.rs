#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use capm_data as data;
pub use capm_model as model;
pub use capm_output as output;

pub use capm_data::{CsvPriceSource, FramePriceSource, PriceSource, RawPrices, YahooQuoteProvider};
pub use capm_model::{
    AnnualizationMethod, CapmConfig, CapmError, CapmEstimator, CapmRequest, CapmResult,
    FailureKind,
};
pub use capm_output::{CapmReport, ExportFormat, Exporter};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::prelude::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_estimate_through_reexports() {
        // 2024-03-01 through 2024-03-06
        let days: Vec<i32> = (19_783..19_789).collect();
        let frame = DataFrame::new(vec![
            Column::new("date".into(), days).cast(&DataType::Date).unwrap(),
            Column::new("ACME".into(), [10.0, 10.5, 10.2, 10.9, 11.4, 11.1]),
            Column::new("^GSPC".into(), [100.0, 101.0, 100.5, 102.0, 103.0, 102.4]),
        ])
        .unwrap();

        let request = CapmRequest::new(
            "ACME",
            "^GSPC",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            0.04,
        );
        let config = CapmConfig::default().with_verbose(false);
        let estimator = CapmEstimator::new(FramePriceSource::new(frame), config.clone());

        let result = estimator.estimate(&request).await.unwrap();
        assert_eq!(result.n_obs(), 5);
        assert!(result.beta() > 0.0);

        let report = CapmReport::new(&request, &config, result);
        assert!(report.to_string().starts_with("ACME vs ^GSPC"));
    }
}
