//! Portfolio risk/return metrics.
//!
//! Provides the annualized Sharpe ratio, max drawdown and annualized volatility
//! of a weighted portfolio.

use serde::{Deserialize, Serialize};

use super::returns::{cumulative_returns, portfolio_returns};
use crate::input::Weights;
use crate::types::{DatedSeries, Frame};
use crate::{Error, Result};

/// Trading days used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Standard deviations below this are treated as zero (rounding noise).
const MIN_STD: f64 = 1e-12;

/// How max drawdown is measured.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum DrawdownMethod {
    /// `(min(cumsum) - max(cumsum)) / max(cumsum)` over the summed returns
    #[default]
    CumulativeSumRange,
    /// Largest decline of compounded value from its running peak
    PeakToTrough,
}

impl DrawdownMethod {
    /// Apply this method to a return series.
    pub fn measure(self, returns: &[f64]) -> f64 {
        match self {
            DrawdownMethod::PeakToTrough => max_drawdown(returns),
            DrawdownMethod::CumulativeSumRange => cumulative_sum_drawdown(returns),
        }
    }
}

/// Parameters for metric calculation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricOptions {
    /// Annual risk-free rate (0.04 for 4%)
    pub risk_free_rate: f64,
    /// Periods per year used for annualization
    pub periods_per_year: f64,
    /// Drawdown measure
    pub drawdown_method: DrawdownMethod,
}

impl Default for MetricOptions {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            drawdown_method: DrawdownMethod::default(),
        }
    }
}

/// Performance metrics of a portfolio return series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    /// Annualized Sharpe ratio
    pub sharpe_ratio: f64,
    /// Max drawdown as a non-positive fraction (-0.25 for a 25% decline)
    pub max_drawdown: f64,
    /// Annualized volatility as a fraction
    pub volatility: f64,
    /// Compounded return over the whole period
    pub total_return: f64,
    /// Mean daily return
    pub mean_daily_return: f64,
    /// Number of daily returns used
    pub observations: usize,
    /// Drawdown measure used for `max_drawdown`
    pub drawdown_method: DrawdownMethod,
}

/// Calculate portfolio metrics from per-ticker daily returns and weights.
///
/// # Arguments
///
/// * `daily_returns` - Per-ticker daily returns (see [`super::pct_change`])
/// * `weights` - One weight per ticker, in column order
/// * `options` - Risk-free rate, annualization and drawdown method
///
/// # Returns
///
/// Returns `PerformanceMetrics`, or an error if the weights don't fit the
/// table or there are fewer than two portfolio returns.
pub fn calculate_metrics(
    daily_returns: &Frame,
    weights: &Weights,
    options: &MetricOptions,
) -> Result<PerformanceMetrics> {
    let portfolio = portfolio_returns(daily_returns, weights.as_slice())?;
    series_metrics(&portfolio, options)
}

/// Calculate metrics from an already weighted portfolio return series.
pub fn series_metrics(
    portfolio: &DatedSeries,
    options: &MetricOptions,
) -> Result<PerformanceMetrics> {
    let returns = &portfolio.values;
    if returns.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "need at least 2 daily returns, got {}",
            returns.len()
        )));
    }

    let total_return = cumulative_returns(portfolio)
        .last()
        .map(|(_, value)| value - 1.0)
        .unwrap_or(0.0);

    Ok(PerformanceMetrics {
        sharpe_ratio: sharpe_ratio(returns, options.risk_free_rate, options.periods_per_year),
        max_drawdown: options.drawdown_method.measure(returns),
        volatility: volatility(returns, options.periods_per_year),
        total_return,
        mean_daily_return: mean(returns),
        observations: returns.len(),
        drawdown_method: options.drawdown_method,
    })
}

fn mean(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().sum::<f64>() / returns.len() as f64
}

/// Population standard deviation (divides by `n`).
fn std_dev(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mean = mean(returns);
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt()
}

/// Calculate the annualized Sharpe ratio from daily returns.
///
/// # Arguments
///
/// * `returns` - Daily returns
/// * `risk_free_rate` - Annual risk-free rate
/// * `periods_per_year` - Annualization factor (252 for daily data)
///
/// Returns 0 when the returns have no dispersion.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let std = std_dev(returns);
    if std < MIN_STD {
        return 0.0;
    }

    let periodic_rf = risk_free_rate / periods_per_year;
    (mean(returns) - periodic_rf) / std * periods_per_year.sqrt()
}

/// Calculate annualized volatility (as a fraction) from daily returns.
pub fn volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    std_dev(returns) * periods_per_year.sqrt()
}

/// Calculate maximum drawdown from a series of returns.
///
/// Returns the largest peak-to-trough decline of the compounded value as a
/// non-positive fraction (e.g., -0.15 for a 15% drawdown). The starting value
/// of 1.0 counts as the first peak.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cum = 1.0;
    let mut running_max = 1.0;
    let mut max_drawdown = 0.0_f64;

    for r in returns {
        cum *= 1.0 + r;
        if cum > running_max {
            running_max = cum;
        }
        let drawdown = (cum - running_max) / running_max;
        if drawdown < max_drawdown {
            max_drawdown = drawdown;
        }
    }

    max_drawdown
}

/// Drawdown from the range of the summed returns.
///
/// Computes `(min(cumsum) - max(cumsum)) / max(cumsum)`, the default
/// measure of [`DrawdownMethod`]. The running sum starts at 0 and that
/// starting point is part of the range, so `max(cumsum) >= 0` and the result
/// is never positive. This ignores the order of peak and trough; see
/// [`max_drawdown`] for the running-peak measure. Returns 0 when
/// `max(cumsum)` is 0.
pub fn cumulative_sum_drawdown(returns: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut min = 0.0_f64;
    let mut max = 0.0_f64;
    for r in returns {
        sum += r;
        min = min.min(sum);
        max = max.max(sum);
    }

    if max == 0.0 {
        return 0.0;
    }
    (min - max) / max
}
