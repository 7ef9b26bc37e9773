//! Market data client for the Yahoo Finance chart API.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime};
use futures::future::try_join_all;
use portfolio_core::{Error, QuoteTable, Result, ADJ_CLOSE, CLOSE};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;

/// Source of daily quote tables.
pub trait PriceSource {
    /// Fetch daily quotes for `tickers` from `start` (inclusive) to `end`
    /// (exclusive).
    fn fetch_quotes(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<QuoteTable>>;
}

// ============================================================================
// Chart API response
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

/// Daily closes of one ticker, keyed by exchange-local date.
#[derive(Debug, Default, PartialEq)]
struct TickerQuotes {
    adj_close: BTreeMap<NaiveDate, f64>,
    close: BTreeMap<NaiveDate, f64>,
}

impl TickerQuotes {
    fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.adj_close.keys().chain(self.close.keys())
    }
}

// ============================================================================
// Client
// ============================================================================

/// Yahoo Finance chart API client.
#[derive(Debug, Clone)]
pub struct YahooFinance {
    base_url: String,
    client: Client,
}

impl YahooFinance {
    /// Create a client from provider settings.
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_ticker(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TickerQuotes> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp();
        debug!(ticker, period1, period2, "requesting chart");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::NoData(format!("request for {} failed: {}", ticker, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::NoData(format!("reading response for {} failed: {}", ticker, e)))?;

        // Yahoo reports unknown symbols as 404 with a chart.error body.
        if !status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<ChartResponse>(&body) {
                if let Some(error) = parsed.chart.error {
                    return Err(provider_error(ticker, &error));
                }
            }
            return Err(Error::NoData(format!(
                "request for {} failed: {}",
                ticker, status
            )));
        }

        parse_chart(ticker, &body)
    }
}

impl PriceSource for YahooFinance {
    async fn fetch_quotes(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<QuoteTable> {
        info!(tickers = ?tickers, %start, %end, "fetching quotes");

        let fetched = try_join_all(
            tickers
                .iter()
                .map(|ticker| self.fetch_ticker(ticker, start, end)),
        )
        .await?;

        let quotes: Vec<(String, TickerQuotes)> = tickers.iter().cloned().zip(fetched).collect();
        let table = merge_quotes(quotes);
        debug!(rows = table.dates().len(), "merged quote table");
        Ok(table)
    }
}

fn provider_error(ticker: &str, error: &ChartError) -> Error {
    Error::NoData(format!("{}: {} ({})", ticker, error.description, error.code))
}

/// Parse one chart response body.
fn parse_chart(ticker: &str, body: &str) -> Result<TickerQuotes> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| Error::NoData(format!("malformed response for {}: {}", ticker, e)))?;

    if let Some(error) = response.chart.error {
        return Err(provider_error(ticker, &error));
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(Error::NoData(format!("empty result for {}", ticker)));
    };

    let offset = data.meta.gmtoffset;
    let close = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    let adj_close = data
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut quotes = TickerQuotes::default();
    for (idx, ts) in data.timestamp.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            warn!(ticker, ts, "skipping out-of-range timestamp");
            continue;
        };
        // Later bars on the same date replace earlier ones.
        if let Some(value) = close.get(idx).copied().flatten() {
            quotes.close.insert(date, value);
        }
        if let Some(value) = adj_close.get(idx).copied().flatten() {
            quotes.adj_close.insert(date, value);
        }
    }

    debug!(
        ticker,
        closes = quotes.close.len(),
        adj_closes = quotes.adj_close.len(),
        "parsed chart"
    );
    Ok(quotes)
}

/// Outer-join per-ticker quotes on date.
///
/// A single ticker yields a [`QuoteTable::Single`]; several yield a
/// [`QuoteTable::Multi`] keyed by `(field, ticker)`.
fn merge_quotes(quotes: Vec<(String, TickerQuotes)>) -> QuoteTable {
    let dates: Vec<NaiveDate> = quotes
        .iter()
        .flat_map(|(_, q)| q.dates().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let column = |values: &BTreeMap<NaiveDate, f64>| -> Vec<Option<f64>> {
        dates.iter().map(|d| values.get(d).copied()).collect()
    };

    if quotes.len() == 1 {
        let mut columns = BTreeMap::new();
        let (_, q) = &quotes[0];
        if !q.adj_close.is_empty() {
            columns.insert(ADJ_CLOSE.to_string(), column(&q.adj_close));
        }
        if !q.close.is_empty() {
            columns.insert(CLOSE.to_string(), column(&q.close));
        }
        return QuoteTable::Single { dates, columns };
    }

    // Adjusted closes are only usable when every ticker has them.
    let adjusted = quotes.iter().all(|(_, q)| !q.adj_close.is_empty());
    let mut columns = BTreeMap::new();
    for (ticker, q) in &quotes {
        if adjusted {
            columns.insert((ADJ_CLOSE.to_string(), ticker.clone()), column(&q.adj_close));
        }
        columns.insert((CLOSE.to_string(), ticker.clone()), column(&q.close));
    }
    QuoteTable::Multi { dates, columns }
}
