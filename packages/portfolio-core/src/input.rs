//! Parsing and validation of user-supplied tickers, weights and dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::TickerWeight;
use crate::{Error, Result};

/// Allowed distance of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Parse a comma-separated ticker list.
///
/// Entries are trimmed and upper-cased; empty entries are dropped. The order
/// of the input is preserved since weights are matched to tickers by
/// position.
pub fn parse_tickers(input: &str) -> Result<Vec<String>> {
    let mut tickers: Vec<String> = Vec::new();

    for raw in input.split(',') {
        let ticker = raw.trim().to_uppercase();
        if ticker.is_empty() {
            continue;
        }
        if tickers.contains(&ticker) {
            return Err(Error::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    if tickers.is_empty() {
        return Err(Error::EmptyTickers);
    }

    Ok(tickers)
}

/// Parse `YYYY-MM-DD` start and end dates and check that start < end.
pub fn parse_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parse = |label: &str, value: &str| {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            Error::InvalidDateRange(format!("{} date '{}' is not YYYY-MM-DD", label, value.trim()))
        })
    };

    let start_date = parse("start", start)?;
    let end_date = parse("end", end)?;
    check_date_range(start_date, end_date)?;

    Ok((start_date, end_date))
}

/// Check that the start date comes before the end date.
pub fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start >= end {
        return Err(Error::InvalidDateRange(format!(
            "start date {} must be before end date {}",
            start, end
        )));
    }
    Ok(())
}

/// Portfolio weights, one per ticker, in ticker order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Weights(Vec<f64>);

impl Weights {
    /// Wrap already-numeric weights without validating them.
    pub fn new(weights: Vec<f64>) -> Self {
        Self(weights)
    }

    /// Parse a comma-separated weight list such as `"0.33, 0.33, 0.34"`.
    ///
    /// Empty entries (e.g. a trailing comma) are ignored.
    pub fn parse(input: &str) -> Result<Self> {
        input
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|w| w.is_finite())
                    .ok_or_else(|| Error::InvalidWeight(raw.to_string()))
            })
            .collect::<Result<Vec<f64>>>()
            .map(Self)
    }

    /// Parse and validate against a ticker count in one step.
    pub fn parse_for(input: &str, ticker_count: usize) -> Result<Self> {
        let weights = Self::parse(input)?;
        weights.validate(ticker_count)?;
        Ok(weights)
    }

    /// Check the count matches the tickers and the weights sum to 1.
    pub fn validate(&self, ticker_count: usize) -> Result<()> {
        if self.0.len() != ticker_count {
            return Err(Error::WeightCountMismatch {
                weights: self.0.len(),
                tickers: ticker_count,
            });
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::WeightSum(sum));
        }

        Ok(())
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Number of weights.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no weights.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Weights as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Pair each weight with its ticker.
    pub fn labelled(&self, tickers: &[String]) -> Vec<TickerWeight> {
        tickers
            .iter()
            .zip(self.0.iter())
            .map(|(ticker, &weight)| TickerWeight {
                ticker: ticker.clone(),
                weight,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tickers_normalizes() {
        let tickers = parse_tickers(" aapl, Msft ,googl").unwrap();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "GOOGL"]);
    }

    #[test]
    fn test_parse_tickers_drops_empty_entries() {
        let tickers = parse_tickers("AAPL,, MSFT,").unwrap();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_parse_tickers_empty() {
        assert!(matches!(parse_tickers(" , "), Err(Error::EmptyTickers)));
        assert!(matches!(parse_tickers(""), Err(Error::EmptyTickers)));
    }

    #[test]
    fn test_parse_tickers_duplicate() {
        let result = parse_tickers("AAPL, aapl");
        assert!(matches!(result, Err(Error::DuplicateTicker(t)) if t == "AAPL"));
    }

    #[test]
    fn test_parse_date_range() {
        let (start, end) = parse_date_range("2020-01-01", " 2021-06-30 ").unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2021, 6, 30).unwrap());
    }

    #[test]
    fn test_parse_date_range_rejects_reversed() {
        let result = parse_date_range("2021-01-01", "2020-01-01");
        assert!(matches!(result, Err(Error::InvalidDateRange(_))));

        let same = parse_date_range("2021-01-01", "2021-01-01");
        assert!(matches!(same, Err(Error::InvalidDateRange(_))));
    }

    #[test]
    fn test_parse_date_range_rejects_garbage() {
        let result = parse_date_range("yesterday", "2020-01-01");
        assert!(matches!(result, Err(Error::InvalidDateRange(msg)) if msg.contains("yesterday")));
    }

    #[test]
    fn test_parse_weights() {
        let weights = Weights::parse("0.33, 0.33, 0.34").unwrap();
        assert_eq!(weights.as_slice(), &[0.33, 0.33, 0.34]);
        assert!(weights.validate(3).is_ok());
    }

    #[test]
    fn test_parse_weights_non_numeric() {
        let result = Weights::parse("0.5, half");
        assert!(matches!(result, Err(Error::InvalidWeight(w)) if w == "half"));

        let nan = Weights::parse("NaN, 1.0");
        assert!(matches!(nan, Err(Error::InvalidWeight(_))));
    }

    #[test]
    fn test_validate_count_mismatch() {
        let weights = Weights::parse("0.5, 0.5").unwrap();
        let result = weights.validate(3);
        assert!(matches!(
            result,
            Err(Error::WeightCountMismatch {
                weights: 2,
                tickers: 3
            })
        ));
    }

    #[test]
    fn test_validate_sum() {
        let weights = Weights::parse("0.5, 0.4").unwrap();
        assert!(matches!(weights.validate(2), Err(Error::WeightSum(_))));

        // Float noise below the tolerance is accepted
        let weights = Weights::new(vec![0.1, 0.2, 0.7000000001]);
        assert!(weights.validate(3).is_ok());
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        let err = Weights::parse_for("0.5, 0.4", 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Weights must sum to 1 (got 0.9). Please adjust your weights."
        );

        let err = Weights::parse_for("1.0", 2).unwrap_err();
        assert_eq!(err.to_string(), "Expected 2 weights (one per ticker), got 1.");
    }

    #[test]
    fn test_labelled() {
        let weights = Weights::new(vec![0.6, 0.4]);
        let tickers = vec!["AAPL".to_string(), "MSFT".to_string()];
        let labelled = weights.labelled(&tickers);

        assert_eq!(labelled[0].ticker, "AAPL");
        assert_eq!(labelled[1].weight, 0.4);
    }
}
