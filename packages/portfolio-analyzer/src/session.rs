//! One analysis run, and the interactive rerun loop.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use portfolio_core::{
    analyze, extract_close_prices, parse_date_range, parse_tickers, render_html,
    render_html_error, render_json, render_json_error, render_text, AnalysisReport,
    AnalysisRequest, HtmlOptions, MetricOptions, TextOptions,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info, warn};

use crate::market_data::PriceSource;

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Html,
}

impl OutputFormat {
    /// Parse a format name from the config file, falling back to text.
    pub fn from_config(name: &str) -> Self {
        OutputFormat::from_str(name, true).unwrap_or_else(|_| {
            warn!(format = name, "unknown report format in config, using text");
            OutputFormat::Text
        })
    }
}

/// Raw user inputs, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub tickers: String,
    pub start: String,
    pub end: String,
    pub weights: String,
}

/// Runs analyses against a price source and renders them.
pub struct Session<P> {
    source: P,
    options: MetricOptions,
    format: OutputFormat,
    table_rows: usize,
    output: Option<PathBuf>,
}

impl<P: PriceSource> Session<P> {
    pub fn new(source: P, options: MetricOptions, format: OutputFormat, table_rows: usize) -> Self {
        Self {
            source,
            options,
            format,
            table_rows,
            output: None,
        }
    }

    /// Write reports to `path` instead of the output stream.
    pub fn with_output(mut self, path: Option<PathBuf>) -> Self {
        self.output = path;
        self
    }

    /// Validate inputs, fetch prices and analyze them.
    pub async fn run(&self, inputs: &Inputs) -> portfolio_core::Result<AnalysisReport> {
        let tickers = parse_tickers(&inputs.tickers)?;
        let (start, end) = parse_date_range(&inputs.start, &inputs.end)?;
        info!(tickers = ?tickers, %start, %end, "running analysis");

        let table = self.source.fetch_quotes(&tickers, start, end).await?;
        let prices = extract_close_prices(&table, &tickers)?;
        debug!(rows = prices.len(), "extracted close prices");

        let request = AnalysisRequest::new(tickers, start, end, &inputs.weights);
        Ok(analyze(&request, prices, &self.options))
    }

    /// Render a run result; failures become an inline error report.
    pub fn render(&self, result: &portfolio_core::Result<AnalysisReport>) -> Result<String> {
        let html_options = HtmlOptions::default().with_table_rows(self.table_rows);

        let rendered = match (result, self.format) {
            (Ok(report), OutputFormat::Text) => render_text(
                report,
                &TextOptions {
                    table_rows: self.table_rows,
                },
            ),
            (Ok(report), OutputFormat::Json) => render_json(report)?,
            (Ok(report), OutputFormat::Html) => render_html(report, &html_options),
            (Err(e), OutputFormat::Text) => format!("Error: {}\n", e),
            (Err(e), OutputFormat::Json) => render_json_error(&e.to_string())?,
            (Err(e), OutputFormat::Html) => render_html_error(&e.to_string(), &html_options),
        };
        Ok(rendered)
    }

    /// Run once and emit the report.
    pub async fn run_once<W: Write>(&self, inputs: &Inputs, out: &mut W) -> Result<()> {
        let result = self.run(inputs).await;
        if let Err(e) = &result {
            warn!(error = %e, "analysis failed");
        }
        let rendered = self.render(&result)?;
        self.emit(&rendered, out)
    }

    fn emit<W: Write>(&self, rendered: &str, out: &mut W) -> Result<()> {
        match &self.output {
            Some(path) => {
                fs::write(path, rendered)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
                writeln!(out, "Report written to {}", path.display())?;
            }
            None => {
                write!(out, "{}", rendered)?;
                if !rendered.ends_with('\n') {
                    writeln!(out)?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Prompt for inputs and rerun the analysis on every submission.
    ///
    /// An empty answer keeps the previous value. `quit` (or end of input)
    /// ends the loop.
    pub async fn interactive<R, W>(&self, mut inputs: Inputs, reader: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = reader.lines();
        writeln!(
            out,
            "Stock Portfolio Analyzer. Press Enter to keep a value, type 'quit' to exit."
        )?;

        loop {
            for (label, value) in [
                ("Tickers", &mut inputs.tickers),
                ("Start date", &mut inputs.start),
                ("End date", &mut inputs.end),
                ("Weights", &mut inputs.weights),
            ] {
                if !prompt(&mut lines, out, label, value).await? {
                    info!("interactive session ended");
                    return Ok(());
                }
            }

            self.run_once(&inputs, out).await?;
        }
    }
}

/// Ask for one value. Returns `false` when the user quits.
async fn prompt<R, W>(
    lines: &mut Lines<R>,
    out: &mut W,
    label: &str,
    value: &mut String,
) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{} [{}]: ", label, value)?;
    out.flush()?;

    let Some(line) = lines.next_line().await.context("Failed to read input")? else {
        return Ok(false);
    };

    let answer = line.trim();
    if answer.eq_ignore_ascii_case("quit") || answer.eq_ignore_ascii_case("exit") {
        return Ok(false);
    }
    if !answer.is_empty() {
        *value = answer.to_string();
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use portfolio_core::{Error, QuoteTable, CLOSE};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// Serves a fixed table and records the requests it sees.
    struct StaticSource {
        table: QuoteTable,
        requests: RefCell<Vec<Vec<String>>>,
    }

    impl StaticSource {
        fn new() -> Self {
            let dates: Vec<NaiveDate> = (2..=6)
                .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
                .collect();
            let mut columns = BTreeMap::new();
            columns.insert(
                (CLOSE.to_string(), "AAPL".to_string()),
                vec![Some(100.0), Some(102.0), Some(101.0), Some(99.0), Some(103.0)],
            );
            columns.insert(
                (CLOSE.to_string(), "MSFT".to_string()),
                vec![Some(200.0), Some(198.0), Some(204.0), Some(206.0), Some(203.0)],
            );
            Self {
                table: QuoteTable::Multi { dates, columns },
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl PriceSource for StaticSource {
        async fn fetch_quotes(
            &self,
            tickers: &[String],
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> portfolio_core::Result<QuoteTable> {
            self.requests.borrow_mut().push(tickers.to_vec());
            if tickers.iter().any(|t| t == "ZZZZ") {
                return Err(Error::NoData("ZZZZ: symbol may be delisted".to_string()));
            }
            Ok(self.table.clone())
        }
    }

    fn inputs(tickers: &str, weights: &str) -> Inputs {
        Inputs {
            tickers: tickers.to_string(),
            start: "2024-01-01".to_string(),
            end: "2024-01-07".to_string(),
            weights: weights.to_string(),
        }
    }

    fn session(format: OutputFormat) -> Session<StaticSource> {
        Session::new(StaticSource::new(), MetricOptions::default(), format, 10)
    }

    #[tokio::test]
    async fn test_run_ready() {
        let report = session(OutputFormat::Text)
            .run(&inputs("aapl, msft", "0.5, 0.5"))
            .await
            .unwrap();

        assert_eq!(report.request.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(report.prices.len(), 5);
        assert!(report.portfolio.is_ready());
    }

    #[tokio::test]
    async fn test_invalid_dates_skip_fetch() {
        let session = session(OutputFormat::Text);
        let mut bad = inputs("AAPL", "1");
        bad.end = "2023-12-31".to_string();

        let err = session.run(&bad).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDateRange(_)));
        assert!(session.source.requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_text_error_is_inline() {
        let session = session(OutputFormat::Text);
        let mut out = Vec::new();
        session
            .run_once(&inputs("ZZZZ", "1"), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Error: No data fetched: ZZZZ"));
    }

    #[tokio::test]
    async fn test_json_error_envelope() {
        let session = session(OutputFormat::Json);
        let mut out = Vec::new();
        session.run_once(&inputs("", "1"), &mut out).await.unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["ok"], false);
        assert!(json["error"].as_str().unwrap().starts_with("No tickers given"));
    }

    #[tokio::test]
    async fn test_html_written_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.html");
        let session = session(OutputFormat::Html).with_output(Some(path.clone()));

        let mut out = Vec::new();
        session
            .run_once(&inputs("AAPL, MSFT", "0.6, 0.4"), &mut out)
            .await
            .unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("<h2>Performance Metrics</h2>"));
        assert!(String::from_utf8(out).unwrap().contains("Report written to"));
    }

    #[tokio::test]
    async fn test_interactive_keeps_values_and_quits() {
        let session = session(OutputFormat::Text);
        // Round 1 takes every default; round 2 changes only the weights and
        // then quits at the first prompt of round 3.
        let script: &[u8] = b"\n\n\n\n\n\n\n0.2, 0.8\nquit\n";
        let mut out = Vec::new();

        session
            .interactive(inputs("AAPL, MSFT", "0.5, 0.5"), script, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(session.source.requests.borrow().len(), 2);
        assert_eq!(text.matches("Performance Metrics").count(), 2);
        assert!(text.contains("Weights [0.5, 0.5]: "));
        assert!(text.contains("20.0%"));
        assert!(text.contains("80.0%"));
    }

    #[tokio::test]
    async fn test_interactive_shows_weight_error() {
        let session = session(OutputFormat::Text);
        let script: &[u8] = b"\n\n\n0.9, 0.9\n";
        let mut out = Vec::new();

        session
            .interactive(inputs("AAPL, MSFT", "0.5, 0.5"), script, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error: Weights must sum to 1"));
        assert!(text.contains("Stock Data Table"));
    }

    #[test]
    fn test_format_from_config() {
        assert_eq!(OutputFormat::from_config("HTML"), OutputFormat::Html);
        assert_eq!(OutputFormat::from_config("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_config("pdf"), OutputFormat::Text);
    }
}
