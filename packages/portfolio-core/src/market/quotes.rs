//! Provider quote tables and close-price extraction.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::types::Frame;
use crate::{Error, Result};

/// Dividend and split adjusted close.
pub const ADJ_CLOSE: &str = "Adj Close";
/// Raw close.
pub const CLOSE: &str = "Close";
/// Price fields in order of preference.
pub const PRICE_FIELDS: [&str; 2] = [ADJ_CLOSE, CLOSE];

/// Tabular quote data as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteTable {
    /// One ticker; columns keyed by field name (`"Close"`, `"Volume"`, ...).
    Single {
        dates: Vec<NaiveDate>,
        columns: BTreeMap<String, Vec<Option<f64>>>,
    },
    /// Several tickers; columns keyed by `(field, ticker)`.
    Multi {
        dates: Vec<NaiveDate>,
        columns: BTreeMap<(String, String), Vec<Option<f64>>>,
    },
}

impl QuoteTable {
    /// Row labels.
    pub fn dates(&self) -> &[NaiveDate] {
        match self {
            QuoteTable::Single { dates, .. } | QuoteTable::Multi { dates, .. } => dates,
        }
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates().is_empty()
    }

    /// Field names present in the table.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = match self {
            QuoteTable::Single { columns, .. } => columns.keys().map(String::as_str).collect(),
            QuoteTable::Multi { columns, .. } => {
                columns.keys().map(|(field, _)| field.as_str()).collect()
            }
        };
        fields.dedup();
        fields
    }
}

/// Extract the closing-price table for `tickers` from a provider response.
///
/// Prefers [`ADJ_CLOSE`] and falls back to [`CLOSE`]. The returned frame has
/// its columns in the order of `tickers`, regardless of how the provider
/// ordered them.
///
/// # Errors
///
/// - [`Error::NoData`] when the table has no rows, or a requested ticker has
///   no price at any date.
/// - [`Error::MissingPriceColumn`] when neither price field is present, or a
///   single-ticker table was returned for several tickers.
pub fn extract_close_prices(table: &QuoteTable, tickers: &[String]) -> Result<Frame> {
    if table.is_empty() {
        return Err(Error::NoData("provider returned no rows".to_string()));
    }

    let columns = match table {
        QuoteTable::Single { columns, .. } => single_close_column(columns, tickers)?,
        QuoteTable::Multi { columns, .. } => multi_close_columns(columns, tickers)?,
    };

    let missing: Vec<&str> = tickers
        .iter()
        .zip(columns.iter())
        .filter(|(_, values)| values.iter().all(Option::is_none))
        .map(|(ticker, _)| ticker.as_str())
        .collect();
    if !missing.is_empty() {
        warn!(tickers = ?missing, "no prices for requested tickers");
        return Err(Error::NoData(format!("no prices for {}", missing.join(", "))));
    }

    let dates = table.dates().to_vec();
    let rows = (0..dates.len())
        .map(|row| {
            columns
                .iter()
                .map(|values| values.get(row).copied().flatten())
                .collect()
        })
        .collect();

    Frame::new(tickers.to_vec(), dates, rows)
}

fn single_close_column(
    columns: &BTreeMap<String, Vec<Option<f64>>>,
    tickers: &[String],
) -> Result<Vec<Vec<Option<f64>>>> {
    if tickers.len() != 1 {
        return Err(Error::MissingPriceColumn(format!(
            "single-ticker response for {} tickers",
            tickers.len()
        )));
    }

    let (field, values) = PRICE_FIELDS
        .iter()
        .find_map(|field| columns.get(*field).map(|values| (*field, values)))
        .ok_or_else(|| Error::MissingPriceColumn(PRICE_FIELDS.join(" or ")))?;

    debug!(field, ticker = %tickers[0], "extracted single-ticker prices");
    Ok(vec![values.clone()])
}

fn multi_close_columns(
    columns: &BTreeMap<(String, String), Vec<Option<f64>>>,
    tickers: &[String],
) -> Result<Vec<Vec<Option<f64>>>> {
    let field = *PRICE_FIELDS
        .iter()
        .find(|field| columns.keys().any(|(f, _)| f == **field))
        .ok_or_else(|| Error::MissingPriceColumn(PRICE_FIELDS.join(" or ")))?;

    debug!(field, tickers = tickers.len(), "extracted multi-ticker prices");

    Ok(tickers
        .iter()
        .map(|ticker| {
            columns
                .iter()
                .find(|((f, t), _)| f == field && t.eq_ignore_ascii_case(ticker))
                .map(|(_, values)| values.clone())
                .unwrap_or_default()
        })
        .collect())
}
