//! End-to-end analysis of a price table for one set of user inputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::input::Weights;
use crate::portfolio::{
    average_returns, cumulative_returns, pct_change, portfolio_returns, series_metrics,
    AverageReturn, MetricOptions, PerformanceMetrics,
};
use crate::types::{DatedSeries, Frame, TickerWeight};
use crate::Result;

/// User inputs for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    /// Normalized tickers, in user order
    pub tickers: Vec<String>,
    /// First date requested
    pub start: NaiveDate,
    /// End of the requested range (exclusive)
    pub end: NaiveDate,
    /// Raw weight text, validated during analysis
    pub weights: String,
}

impl AnalysisRequest {
    /// Create a new request.
    pub fn new(tickers: Vec<String>, start: NaiveDate, end: NaiveDate, weights: &str) -> Self {
        Self {
            tickers,
            start,
            end,
            weights: weights.to_string(),
        }
    }
}

/// Everything derived from the weights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSection {
    /// Weight per ticker
    pub weights: Vec<TickerWeight>,
    /// Sharpe ratio, max drawdown, volatility
    pub metrics: PerformanceMetrics,
    /// Weighted daily returns
    pub portfolio_returns: DatedSeries,
    /// Growth of one unit invested
    pub cumulative_returns: DatedSeries,
    /// Mean daily return per ticker
    pub average_daily_returns: Vec<AverageReturn>,
}

/// The portfolio part of a report: computed, or rejected with a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PortfolioOutcome {
    Ready(Box<PortfolioSection>),
    Rejected { message: String },
}

impl PortfolioOutcome {
    /// True when the portfolio section was computed.
    pub fn is_ready(&self) -> bool {
        matches!(self, PortfolioOutcome::Ready(_))
    }

    /// The computed section, if any.
    pub fn section(&self) -> Option<&PortfolioSection> {
        match self {
            PortfolioOutcome::Ready(section) => Some(section),
            PortfolioOutcome::Rejected { .. } => None,
        }
    }

    /// The rejection message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            PortfolioOutcome::Ready(_) => None,
            PortfolioOutcome::Rejected { message } => Some(message),
        }
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    /// The request this report answers
    pub request: AnalysisRequest,
    /// Closing prices
    pub prices: Frame,
    /// Per-ticker daily returns
    pub daily_returns: Frame,
    /// Portfolio section or the reason it is missing
    pub portfolio: PortfolioOutcome,
}

/// Analyze closing prices for a request.
///
/// Prices and daily returns are always part of the report. Weight problems
/// (non-numeric entries, wrong count, bad sum) and too-short histories do not
/// fail the run: they show up as [`PortfolioOutcome::Rejected`] so the price
/// sections can still be shown.
pub fn analyze(request: &AnalysisRequest, prices: Frame, options: &MetricOptions) -> AnalysisReport {
    let daily_returns = pct_change(&prices);
    debug!(
        rows = prices.len(),
        tickers = prices.width(),
        "computed daily returns"
    );

    let portfolio = match build_portfolio(&prices, &daily_returns, &request.weights, options) {
        Ok(section) => {
            info!(
                sharpe = section.metrics.sharpe_ratio,
                max_drawdown = section.metrics.max_drawdown,
                volatility = section.metrics.volatility,
                "portfolio metrics ready"
            );
            PortfolioOutcome::Ready(Box::new(section))
        }
        Err(e) => {
            info!(error = %e, "portfolio section rejected");
            PortfolioOutcome::Rejected {
                message: e.to_string(),
            }
        }
    };

    AnalysisReport {
        request: request.clone(),
        prices,
        daily_returns,
        portfolio,
    }
}

fn build_portfolio(
    prices: &Frame,
    daily_returns: &Frame,
    weights_input: &str,
    options: &MetricOptions,
) -> Result<PortfolioSection> {
    let weights = Weights::parse_for(weights_input, prices.width())?;
    let returns = portfolio_returns(daily_returns, weights.as_slice())?;
    let metrics = series_metrics(&returns, options)?;
    let cumulative = cumulative_returns(&returns);

    Ok(PortfolioSection {
        weights: weights.labelled(prices.tickers()),
        metrics,
        portfolio_returns: returns,
        cumulative_returns: cumulative,
        average_daily_returns: average_returns(daily_returns),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) fn sample_prices() -> Frame {
        let dates = (2..=6)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        Frame::new(
            vec!["AAPL".to_string(), "MSFT".to_string()],
            dates,
            vec![
                vec![Some(100.0), Some(200.0)],
                vec![Some(102.0), Some(198.0)],
                vec![Some(101.0), Some(204.0)],
                vec![Some(99.0), Some(206.0)],
                vec![Some(103.0), Some(203.0)],
            ],
        )
        .unwrap()
    }

    pub(crate) fn sample_request(weights: &str) -> AnalysisRequest {
        AnalysisRequest::new(
            vec!["AAPL".to_string(), "MSFT".to_string()],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            weights,
        )
    }

    #[test]
    fn test_analyze_ready() {
        let report = analyze(
            &sample_request("0.6, 0.4"),
            sample_prices(),
            &MetricOptions::default(),
        );

        let section = report.portfolio.section().unwrap();
        assert_eq!(report.daily_returns.len(), 5);
        assert_eq!(section.portfolio_returns.len(), 5);
        assert_eq!(section.cumulative_returns.len(), 5);
        assert_eq!(section.weights[0].ticker, "AAPL");
        assert_eq!(section.metrics.observations, 5);

        // Day 1 has no returns; day 2: 0.6 * 0.02 + 0.4 * -0.01
        assert_eq!(section.portfolio_returns.values[0], 0.0);
        assert_eq!(section.cumulative_returns.values[0], 1.0);
        assert_relative_eq!(section.portfolio_returns.values[1], 0.008, epsilon = 1e-12);
        assert_relative_eq!(section.cumulative_returns.values[1], 1.008, epsilon = 1e-12);
    }

    #[test]
    fn test_analyze_rejects_bad_sum_but_keeps_prices() {
        let report = analyze(
            &sample_request("0.5, 0.4"),
            sample_prices(),
            &MetricOptions::default(),
        );

        assert!(!report.portfolio.is_ready());
        assert_eq!(
            report.portfolio.message(),
            Some("Weights must sum to 1 (got 0.9). Please adjust your weights.")
        );
        assert_eq!(report.prices.len(), 5);
        assert_eq!(report.daily_returns.len(), 5);
    }

    #[test]
    fn test_analyze_rejects_non_numeric_weight() {
        let report = analyze(
            &sample_request("0.5, abc"),
            sample_prices(),
            &MetricOptions::default(),
        );
        let message = report.portfolio.message().unwrap();
        assert!(message.contains("'abc'"));
    }

    #[test]
    fn test_analyze_rejects_weight_count() {
        let report = analyze(&sample_request("1.0"), sample_prices(), &MetricOptions::default());
        assert_eq!(
            report.portfolio.message(),
            Some("Expected 2 weights (one per ticker), got 1.")
        );
    }

    #[test]
    fn test_analyze_short_history() {
        // A single price gives a single (empty) return row
        let prices = Frame::new(
            vec!["AAPL".to_string()],
            vec![NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()],
            vec![vec![Some(1.0)]],
        )
        .unwrap();
        let mut request = sample_request("1");
        request.tickers.truncate(1);

        let report = analyze(&request, prices, &MetricOptions::default());
        assert!(report.portfolio.message().unwrap().contains("Insufficient data"));
    }

    #[test]
    fn test_report_serializes() {
        let report = analyze(
            &sample_request("0.5, 0.5"),
            sample_prices(),
            &MetricOptions::default(),
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["portfolio"]["status"], "ready");
        assert!(json["portfolio"]["metrics"]["sharpe_ratio"].is_number());
        assert_eq!(json["prices"]["tickers"][1], "MSFT");
    }
}
