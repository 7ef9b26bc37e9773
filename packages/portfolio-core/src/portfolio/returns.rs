//! Daily, portfolio and cumulative returns.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{DatedSeries, Frame};
use crate::{Error, Result};

/// Percentage change between consecutive dates, per ticker.
///
/// The first row has no previous price and is all `None`. A missing price is
/// bridged by the last available price of the same ticker, so the return
/// after a gap spans the whole gap. A previous price of zero yields `None`.
pub fn pct_change(prices: &Frame) -> Frame {
    let mut last_seen: Vec<Option<f64>> = vec![None; prices.width()];
    let mut rows = Vec::with_capacity(prices.len());

    for row in prices.rows() {
        let returns = row
            .iter()
            .zip(last_seen.iter_mut())
            .map(|(&price, previous)| {
                let price = price?;
                let change = match *previous {
                    Some(prev) if prev != 0.0 => Some(price / prev - 1.0),
                    _ => None,
                };
                *previous = Some(price);
                change
            })
            .collect();
        rows.push(returns);
    }

    prices.with_rows(rows)
}

/// Weighted sum of per-ticker daily returns.
///
/// Missing per-ticker returns contribute nothing to the sum, so a date where
/// no ticker has a return (the first row) yields 0. Every date of
/// `daily_returns` is kept.
pub fn portfolio_returns(daily_returns: &Frame, weights: &[f64]) -> Result<DatedSeries> {
    if weights.len() != daily_returns.width() {
        return Err(Error::WeightCountMismatch {
            weights: weights.len(),
            tickers: daily_returns.width(),
        });
    }

    let mut dates = Vec::with_capacity(daily_returns.len());
    let mut values = Vec::with_capacity(daily_returns.len());

    for (date, row) in daily_returns.dates().iter().zip(daily_returns.rows()) {
        let value = row
            .iter()
            .zip(weights)
            .filter_map(|(r, w)| r.map(|r| r * w))
            .sum::<f64>();
        dates.push(*date);
        values.push(value);
    }

    debug!(observations = values.len(), "computed portfolio returns");
    DatedSeries::new(Some("Portfolio".to_string()), dates, values)
}

/// Growth of one unit invested: running product of `1 + r`.
pub fn cumulative_returns(returns: &DatedSeries) -> DatedSeries {
    let mut cum = 1.0;
    let values = returns
        .values
        .iter()
        .map(|r| {
            cum *= 1.0 + r;
            cum
        })
        .collect();

    DatedSeries {
        name: returns.name.clone(),
        dates: returns.dates.clone(),
        values,
    }
}

/// Mean daily return of one ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AverageReturn {
    /// Ticker symbol
    pub ticker: String,
    /// Mean of the available daily returns, `None` if there are none
    pub mean: Option<f64>,
}

/// Per-ticker mean of available daily returns.
pub fn average_returns(daily_returns: &Frame) -> Vec<AverageReturn> {
    daily_returns
        .tickers()
        .iter()
        .enumerate()
        .map(|(idx, ticker)| {
            let values: Vec<f64> = daily_returns.column(idx).into_iter().flatten().collect();
            let mean = if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            };
            AverageReturn {
                ticker: ticker.clone(),
                mean,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn prices() -> Frame {
        Frame::new(
            vec!["AAPL".to_string(), "MSFT".to_string()],
            vec![day(1), day(2), day(3), day(6)],
            vec![
                vec![Some(100.0), Some(50.0)],
                vec![Some(110.0), None],
                vec![Some(99.0), Some(55.0)],
                vec![Some(99.0), Some(44.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_pct_change() {
        let returns = pct_change(&prices());

        assert_eq!(returns.rows()[0], vec![None, None]);
        assert_relative_eq!(returns.rows()[1][0].unwrap(), 0.10, epsilon = 1e-12);
        assert_eq!(returns.rows()[1][1], None);
        assert_relative_eq!(returns.rows()[2][0].unwrap(), -0.10, epsilon = 1e-12);
        // Gap bridged from 50 to 55
        assert_relative_eq!(returns.rows()[2][1].unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(returns.rows()[3][0].unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(returns.rows()[3][1].unwrap(), -0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_pct_change_zero_price() {
        let prices = Frame::new(
            vec!["X".to_string()],
            vec![day(1), day(2), day(3)],
            vec![vec![Some(0.0)], vec![Some(1.0)], vec![Some(2.0)]],
        )
        .unwrap();

        let returns = pct_change(&prices);
        assert_eq!(returns.column(0)[1], None);
        assert_relative_eq!(returns.column(0)[2].unwrap(), 1.0);
    }

    #[test]
    fn test_portfolio_returns_weighted_sum() {
        let returns = pct_change(&prices());
        let portfolio = portfolio_returns(&returns, &[0.5, 0.5]).unwrap();

        // First row has no returns at all and sums to 0
        assert_eq!(portfolio.dates, vec![day(1), day(2), day(3), day(6)]);
        assert_eq!(portfolio.values[0], 0.0);
        // MSFT missing on day 2 contributes nothing
        assert_relative_eq!(portfolio.values[1], 0.05, epsilon = 1e-12);
        assert_relative_eq!(portfolio.values[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(portfolio.values[3], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_returns_single_ticker_keeps_first_row() {
        let prices = Frame::new(
            vec!["AAPL".to_string()],
            vec![day(1), day(2), day(3), day(6)],
            vec![
                vec![Some(100.0)],
                vec![Some(101.0)],
                vec![Some(103.0)],
                vec![Some(102.0)],
            ],
        )
        .unwrap();

        let portfolio = portfolio_returns(&pct_change(&prices), &[1.0]).unwrap();

        assert_eq!(portfolio.len(), 4);
        assert_eq!(portfolio.values[0], 0.0);
        assert_relative_eq!(portfolio.values[1], 0.01, epsilon = 1e-12);
        assert_relative_eq!(portfolio.values[2], 103.0 / 101.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(portfolio.values[3], 102.0 / 103.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_returns_weight_count() {
        let returns = pct_change(&prices());
        let result = portfolio_returns(&returns, &[1.0]);
        assert!(matches!(result, Err(Error::WeightCountMismatch { .. })));
    }

    #[test]
    fn test_cumulative_returns() {
        let series = DatedSeries::new(None, vec![day(1), day(2), day(3)], vec![0.10, -0.10, 0.05])
            .unwrap();
        let cumulative = cumulative_returns(&series);

        assert_relative_eq!(cumulative.values[0], 1.10, epsilon = 1e-12);
        assert_relative_eq!(cumulative.values[1], 0.99, epsilon = 1e-12);
        assert_relative_eq!(cumulative.values[2], 1.0395, epsilon = 1e-12);
        assert_eq!(cumulative.dates, series.dates);
    }

    #[test]
    fn test_average_returns() {
        let averages = average_returns(&pct_change(&prices()));

        assert_eq!(averages[0].ticker, "AAPL");
        assert_relative_eq!(averages[0].mean.unwrap(), 0.0, epsilon = 1e-12);
        // (0.10 - 0.20) / 2
        assert_relative_eq!(averages[1].mean.unwrap(), -0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_average_returns_no_values() {
        let prices = Frame::new(vec!["X".to_string()], vec![day(1)], vec![vec![Some(1.0)]]).unwrap();
        let averages = average_returns(&pct_change(&prices));
        assert_eq!(averages[0].mean, None);
    }
}
