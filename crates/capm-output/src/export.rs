//! CSV and JSON export of CAPM reports.

use crate::report::CapmReport;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One CSV row per report.
#[derive(Debug, Serialize)]
struct CapmReportRow {
    ticker: String,
    benchmark: String,
    period_start: NaiveDate,
    period_end: NaiveDate,
    periods_per_year: u32,
    return_kind: &'static str,
    annualization: &'static str,
    risk_free_rate: f64,
    market_annual_return: f64,
    market_risk_premium: f64,
    beta: f64,
    alpha: f64,
    beta_stderr: f64,
    r_squared: f64,
    n_obs: usize,
    expected_return: f64,
}

impl From<&CapmReport> for CapmReportRow {
    fn from(report: &CapmReport) -> Self {
        let r = &report.result;
        Self {
            ticker: report.ticker.clone(),
            benchmark: report.benchmark.clone(),
            period_start: report.period_start,
            period_end: report.period_end,
            periods_per_year: report.periods_per_year,
            return_kind: if report.use_log_returns { "log" } else { "simple" },
            annualization: report.annualization.as_str(),
            risk_free_rate: report.risk_free_rate,
            market_annual_return: r.market_annual_return(),
            market_risk_premium: r.market_risk_premium(),
            beta: r.beta(),
            alpha: r.alpha(),
            beta_stderr: r.beta_stderr(),
            r_squared: r.r_squared(),
            n_obs: r.n_obs(),
            expected_return: r.expected_return(),
        }
    }
}

fn rows_to_csv<'a>(
    reports: impl IntoIterator<Item = &'a CapmReport>,
) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for report in reports {
        wtr.serialize(CapmReportRow::from(report))?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for CapmReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => rows_to_csv([self]),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<CapmReport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => rows_to_csv(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
