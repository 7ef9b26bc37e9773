//! Portfolio Core - Returns, risk metrics and reporting for stock portfolios.
//!
//! This crate provides everything the analyzer needs once prices are in hand:
//!
//! - **Input parsing**: Ticker lists and weight vectors from free text
//! - **Market data shapes**: Provider quote tables and close-price extraction
//! - **Returns**: Daily percentage change, weighted portfolio returns, cumulative growth
//! - **Risk metrics**: Sharpe ratio, max drawdown, annualized volatility
//! - **Reports**: Text, JSON and HTML/SVG renderings of an analysis
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use portfolio_core::{analyze, AnalysisRequest, Frame, MetricOptions};
//!
//! let dates: Vec<NaiveDate> = (1..=4)
//!     .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
//!     .collect();
//! let prices = Frame::new(
//!     vec!["AAPL".to_string(), "MSFT".to_string()],
//!     dates,
//!     vec![
//!         vec![Some(100.0), Some(200.0)],
//!         vec![Some(101.0), Some(198.0)],
//!         vec![Some(103.0), Some(202.0)],
//!         vec![Some(102.0), Some(204.0)],
//!     ],
//! )
//! .unwrap();
//!
//! let request = AnalysisRequest::new(
//!     vec!["AAPL".to_string(), "MSFT".to_string()],
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!     "0.5, 0.5",
//! );
//! let report = analyze(&request, prices, &MetricOptions::default());
//! assert!(report.portfolio.is_ready());
//! ```

pub mod analysis;
pub mod input;
pub mod market;
pub mod portfolio;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use types::{ApiResponse, DatedSeries, Frame, TickerWeight};

// Re-export main functionality
pub use analysis::{analyze, AnalysisReport, AnalysisRequest, PortfolioOutcome, PortfolioSection};
pub use input::{check_date_range, parse_date_range, parse_tickers, Weights, WEIGHT_SUM_TOLERANCE};
pub use market::{extract_close_prices, QuoteTable, ADJ_CLOSE, CLOSE};
pub use portfolio::{
    average_returns, calculate_metrics, cumulative_returns, cumulative_sum_drawdown,
    max_drawdown, pct_change, portfolio_returns, series_metrics, sharpe_ratio, volatility,
    AverageReturn, DrawdownMethod, MetricOptions, PerformanceMetrics, TRADING_DAYS_PER_YEAR,
};
pub use report::{
    render_html, render_html_error, render_json, render_json_error, render_text, HtmlOptions,
    TextOptions,
};

/// Error types for portfolio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No tickers given. Enter one or more comma-separated symbols.")]
    EmptyTickers,

    #[error("Ticker {0} is listed more than once.")]
    DuplicateTicker(String),

    #[error("Invalid weight '{0}': weights must be numbers.")]
    InvalidWeight(String),

    #[error("Expected {tickers} weights (one per ticker), got {weights}.")]
    WeightCountMismatch { weights: usize, tickers: usize },

    #[error("Weights must sum to 1 (got {0}). Please adjust your weights.")]
    WeightSum(f64),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("No data fetched: {0}. Please check the tickers and date range.")]
    NoData(String),

    #[error("No usable price column (looked for {0}).")]
    MissingPriceColumn(String),

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// Result type for portfolio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
