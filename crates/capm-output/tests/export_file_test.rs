//! File export of CAPM reports.

use capm_model::{CapmConfig, CapmRequest, RegressionResult, compose};
use capm_output::{CapmReport, ExportFormat, Exporter};
use chrono::NaiveDate;
use std::path::PathBuf;

fn report() -> CapmReport {
    let fit = RegressionResult {
        slope: 0.9,
        intercept: -0.0001,
        r_value: 0.6,
        stderr: 0.05,
        intercept_stderr: 0.0004,
        n: 250,
    };
    let request = CapmRequest::new(
        "KO",
        "^GSPC",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        0.03,
    );
    let config = CapmConfig::default().with_log_returns(true);
    CapmReport::new(&request, &config, compose(0.03, &fit, 0.08))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("capm-output-{}-{name}", std::process::id()))
}

#[test]
fn writes_csv_file() {
    let path = temp_path("report.csv");
    report().export_to_file(&path, ExportFormat::Csv).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("KO,^GSPC,2024-01-01,2025-01-01,252,log,arithmetic,0.03"));
}

#[test]
fn writes_json_file() {
    let path = temp_path("report.json");
    let written = report();
    written
        .export_to_file(&path, ExportFormat::PrettyJson)
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["ticker"], written.ticker.as_str());
    assert_eq!(parsed["use_log_returns"], true);
    let expected_return = parsed["result"]["expected_return"].as_f64().unwrap();
    assert!((expected_return - written.result.expected_return()).abs() < 1e-12);
}

#[test]
fn missing_directory_is_io_error() {
    let path = temp_path("missing-dir").join("report.csv");
    let err = report().export_to_file(&path, ExportFormat::Csv).unwrap_err();
    assert!(matches!(err, capm_output::ExportError::Io(_)));
}
