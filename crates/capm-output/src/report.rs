//! Human-readable CAPM report.

use capm_model::{AnnualizationMethod, CapmConfig, CapmRequest, CapmResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// A CAPM estimate together with the inputs that produced it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CapmReport {
    /// Security symbol.
    pub ticker: String,

    /// Benchmark symbol.
    pub benchmark: String,

    /// Start of the requested history.
    pub period_start: NaiveDate,

    /// End of the requested history (exclusive).
    pub period_end: NaiveDate,

    /// Annual risk-free rate.
    pub risk_free_rate: f64,

    /// Return periods per year.
    pub periods_per_year: u32,

    /// Whether log returns were used.
    pub use_log_returns: bool,

    /// Market return annualization method.
    pub annualization: AnnualizationMethod,

    /// The estimate.
    pub result: CapmResult,
}

impl CapmReport {
    /// Bundle a result with its request and configuration.
    pub fn new(request: &CapmRequest, config: &CapmConfig, result: CapmResult) -> Self {
        Self {
            ticker: request.ticker.clone(),
            benchmark: request.benchmark.clone(),
            period_start: request.start,
            period_end: request.end,
            risk_free_rate: request.risk_free_rate,
            periods_per_year: config.periods_per_year,
            use_log_returns: config.use_log_returns,
            annualization: config.annualization,
            result,
        }
    }

    const fn return_label(&self) -> &'static str {
        if self.use_log_returns { "log" } else { "simple" }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let r = &self.result;
        let mut output = String::new();

        output.push_str("\nCAPM Analysis Results\n");
        output.push_str(&"=".repeat(64));
        output.push('\n');
        output.push_str(&format!("  Stock Ticker:        {}\n", self.ticker));
        output.push_str(&format!("  Benchmark Ticker:    {}\n", self.benchmark));
        output.push_str(&format!(
            "  Period:              {} to {}\n",
            self.period_start, self.period_end
        ));
        output.push_str(&format!(
            "  Method:              {} returns, {} annualization ({} periods/yr)\n",
            self.return_label(),
            self.annualization,
            self.periods_per_year
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');

        output.push_str(&format!(
            "  Risk-Free Rate (Rf):               {}\n",
            pct(self.risk_free_rate)
        ));
        output.push_str(&format!(
            "  Annualized Market Return (E(Rm)):  {}\n",
            pct(r.market_annual_return())
        ));
        output.push_str(&format!(
            "  Market Risk Premium (MRP):         {}\n",
            pct(r.market_risk_premium())
        ));
        output.push_str(&format!("  Beta (β):                          {:.4}\n", r.beta()));
        output.push_str(&format!("  Alpha (α):                         {:.6}\n", r.alpha()));
        output.push_str(&format!(
            "  Beta StdErr:                       {:.6}\n",
            r.beta_stderr()
        ));
        output.push_str(&format!(
            "  R-squared:                         {:.4}\n",
            r.r_squared()
        ));
        output.push_str(&format!("  Observations:                      {}\n", r.n_obs()));
        output.push_str(&"-".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "  Expected Return (Cost of Equity):  {}\n",
            pct(r.expected_return())
        ));
        output.push_str(&"=".repeat(64));
        output.push('\n');

        output
    }

    /// Format as a Markdown section.
    pub fn to_markdown(&self) -> String {
        let r = &self.result;
        let mut md = String::new();

        md.push_str(&format!("# CAPM: {} vs {}\n\n", self.ticker, self.benchmark));
        md.push_str(&format!(
            "**Period:** {} to {}  \n**Returns:** {}, {} annualization, {} periods/yr\n\n",
            self.period_start,
            self.period_end,
            self.return_label(),
            self.annualization,
            self.periods_per_year
        ));
        md.push_str("| Metric | Value |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Risk-free rate | {} |\n", pct(self.risk_free_rate)));
        md.push_str(&format!(
            "| Annualized market return | {} |\n",
            pct(r.market_annual_return())
        ));
        md.push_str(&format!(
            "| Market risk premium | {} |\n",
            pct(r.market_risk_premium())
        ));
        md.push_str(&format!("| Beta | {:.4} |\n", r.beta()));
        md.push_str(&format!("| Alpha | {:.6} |\n", r.alpha()));
        md.push_str(&format!("| Beta std. error | {:.6} |\n", r.beta_stderr()));
        md.push_str(&format!("| R² | {:.4} |\n", r.r_squared()));
        md.push_str(&format!("| Observations | {} |\n", r.n_obs()));
        md.push_str(&format!(
            "| **Expected return** | **{}** |\n",
            pct(r.expected_return())
        ));

        md
    }
}

impl fmt::Display for CapmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {}: expected return {:.2}% (beta: {:.3}, R²: {:.3}, n: {})",
            self.ticker,
            self.benchmark,
            self.result.expected_return() * 100.0,
            self.result.beta(),
            self.result.r_squared(),
            self.result.n_obs()
        )
    }
}

/// Decimal and percent, e.g. `0.0400 (4.00%)`.
fn pct(value: f64) -> String {
    format!("{:.4} ({:.2}%)", value, value * 100.0)
}
