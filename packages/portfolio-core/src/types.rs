//! Core data types for portfolio analysis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A dated two-dimensional table of optional values, one column per ticker.
///
/// Used both for closing prices and for daily returns. Rows are kept in
/// ascending date order and dates are unique. A `None` cell means the
/// provider had no value for that ticker on that date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    /// Column labels (uppercase ticker symbols), in user order
    tickers: Vec<String>,
    /// Row labels, ascending
    dates: Vec<NaiveDate>,
    /// `rows[date][ticker]`
    rows: Vec<Vec<Option<f64>>>,
}

impl Frame {
    /// Create a frame, sorting rows by date.
    ///
    /// Fails if the row count does not match the date count, if any row has
    /// the wrong width, or if a date appears twice.
    pub fn new(
        tickers: Vec<String>,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if dates.len() != rows.len() {
            return Err(Error::MalformedTable(format!(
                "{} dates vs {} rows",
                dates.len(),
                rows.len()
            )));
        }

        if let Some(bad) = rows.iter().position(|row| row.len() != tickers.len()) {
            return Err(Error::MalformedTable(format!(
                "row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                tickers.len()
            )));
        }

        let mut paired: Vec<(NaiveDate, Vec<Option<f64>>)> = dates.into_iter().zip(rows).collect();
        paired.sort_by_key(|(date, _)| *date);

        if let Some(pair) = paired.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(Error::MalformedTable(format!("duplicate date {}", pair[0].0)));
        }

        let (dates, rows): (Vec<_>, Vec<_>) = paired.into_iter().unzip();

        Ok(Self {
            tickers,
            dates,
            rows,
        })
    }

    /// Same labels, new cells. `rows` must match the shape of `self`.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<Option<f64>>>) -> Self {
        debug_assert_eq!(rows.len(), self.dates.len());
        Self {
            tickers: self.tickers.clone(),
            dates: self.dates.clone(),
            rows,
        }
    }

    /// Column labels.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Row labels.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All rows, each aligned with `tickers()`.
    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.tickers.len()
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, index: usize) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.get(index).copied().flatten()).collect()
    }

    /// Values of the column labelled `ticker` (case insensitive).
    pub fn column_by_ticker(&self, ticker: &str) -> Option<Vec<Option<f64>>> {
        let ticker_upper = ticker.to_uppercase();
        self.tickers
            .iter()
            .position(|t| *t == ticker_upper)
            .map(|idx| self.column(idx))
    }

    /// First and last date, if any.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    /// The last `n` rows as `(date, row)` pairs.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = (&NaiveDate, &Vec<Option<f64>>)> {
        let skip = self.len().saturating_sub(n);
        self.dates.iter().zip(self.rows.iter()).skip(skip)
    }
}

/// A named series of values indexed by date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatedSeries {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Dates, aligned with `values`
    pub dates: Vec<NaiveDate>,
    /// Values, aligned with `dates`
    pub values: Vec<f64>,
}

impl DatedSeries {
    /// Create a series, failing on a length mismatch.
    pub fn new(name: Option<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(Error::MalformedTable(format!(
                "{} dates vs {} values",
                dates.len(),
                values.len()
            )));
        }

        Ok(Self {
            name,
            dates,
            values,
        })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last observation.
    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        Some((*self.dates.last()?, *self.values.last()?))
    }
}

/// One ticker's share of the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickerWeight {
    /// Ticker symbol
    pub ticker: String,
    /// Weight as a fraction (0.25 for 25%)
    pub weight: f64,
}

/// JSON response envelope used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_frame_sorts_rows_by_date() {
        let frame = Frame::new(
            vec!["AAPL".to_string()],
            vec![day(3), day(1), day(2)],
            vec![vec![Some(3.0)], vec![Some(1.0)], vec![Some(2.0)]],
        )
        .unwrap();

        assert_eq!(frame.dates(), &[day(1), day(2), day(3)]);
        assert_eq!(frame.column(0), vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_frame_rejects_ragged_rows() {
        let result = Frame::new(
            vec!["AAPL".to_string(), "MSFT".to_string()],
            vec![day(1), day(2)],
            vec![vec![Some(1.0), Some(2.0)], vec![Some(1.0)]],
        );
        assert!(matches!(result, Err(Error::MalformedTable(_))));
    }

    #[test]
    fn test_frame_rejects_duplicate_dates() {
        let result = Frame::new(
            vec!["AAPL".to_string()],
            vec![day(1), day(1)],
            vec![vec![Some(1.0)], vec![Some(2.0)]],
        );
        assert!(matches!(result, Err(Error::MalformedTable(_))));
    }

    #[test]
    fn test_frame_column_by_ticker() {
        let frame = Frame::new(
            vec!["AAPL".to_string(), "MSFT".to_string()],
            vec![day(1)],
            vec![vec![Some(1.0), None]],
        )
        .unwrap();

        assert_eq!(frame.column_by_ticker("msft"), Some(vec![None]));
        assert!(frame.column_by_ticker("GOOGL").is_none());
    }

    #[test]
    fn test_frame_tail() {
        let frame = Frame::new(
            vec!["AAPL".to_string()],
            vec![day(1), day(2), day(3)],
            vec![vec![Some(1.0)], vec![Some(2.0)], vec![Some(3.0)]],
        )
        .unwrap();

        let tail: Vec<_> = frame.tail(2).map(|(d, _)| *d).collect();
        assert_eq!(tail, vec![day(2), day(3)]);
        assert_eq!(frame.tail(10).count(), 3);
    }

    #[test]
    fn test_series_length_mismatch() {
        let result = DatedSeries::new(None, vec![day(1)], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
