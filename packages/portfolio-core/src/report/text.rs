//! Plain-text terminal report.

use super::format::{cell, ValueFormat};
use crate::analysis::{AnalysisReport, PortfolioSection};
use crate::types::Frame;

/// Options for the text renderer.
#[derive(Debug, Clone)]
pub struct TextOptions {
    /// Rows of the price table to show (most recent)
    pub table_rows: usize,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self { table_rows: 10 }
    }
}

/// Render an analysis for the terminal.
pub fn render_text(report: &AnalysisReport, options: &TextOptions) -> String {
    let mut out = String::new();
    let request = &report.request;

    out.push_str("Stock Portfolio Analyzer\n");
    out.push_str(&format!(
        "{} | {} to {} | {} trading days\n",
        request.tickers.join(", "),
        request.start,
        request.end,
        report.prices.len()
    ));

    match report.portfolio.section() {
        Some(section) => out.push_str(&portfolio_text(report, section, options)),
        None => {
            out.push_str(&format!(
                "\nError: {}\n",
                report.portfolio.message().unwrap_or_default()
            ));
            out.push_str(&table_text(&report.prices, options.table_rows));
        }
    }

    out
}

fn portfolio_text(report: &AnalysisReport, section: &PortfolioSection, options: &TextOptions) -> String {
    let mut out = String::new();
    let metrics = &section.metrics;

    out.push_str("\nPerformance Metrics\n");
    out.push_str(&format!("  Sharpe Ratio:          {:.2}\n", metrics.sharpe_ratio));
    out.push_str(&format!(
        "  Maximum Drawdown:      {}\n",
        ValueFormat::Percent.label(metrics.max_drawdown)
    ));
    out.push_str(&format!(
        "  Annualized Volatility: {}\n",
        ValueFormat::Percent.label(metrics.volatility)
    ));
    out.push_str(&format!(
        "  Total Return:          {}\n",
        ValueFormat::Percent.label(metrics.total_return)
    ));

    if let Some((date, value)) = section.cumulative_returns.last() {
        out.push_str("\nCumulative Portfolio Returns\n");
        out.push_str(&format!("  1.000 grew to {:.3} by {}\n", value, date));
    }

    out.push_str(&table_text(&report.prices, options.table_rows));

    out.push_str("\nAverage Daily Returns\n");
    let width = label_width(section.average_daily_returns.iter().map(|a| a.ticker.as_str()));
    for avg in &section.average_daily_returns {
        let value = avg
            .mean
            .map(|m| format!("{:.4}%", m * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!("  {:<width$}  {:>10}\n", avg.ticker, value, width = width));
    }

    out.push_str("\nPortfolio Weights\n");
    let width = label_width(section.weights.iter().map(|w| w.ticker.as_str()));
    for weight in &section.weights {
        out.push_str(&format!(
            "  {:<width$}  {:>7}\n",
            weight.ticker,
            ValueFormat::Share.label(weight.weight),
            width = width
        ));
    }

    out
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(str::len).max().unwrap_or(0)
}

fn table_text(frame: &Frame, rows: usize) -> String {
    let shown = rows.min(frame.len());
    let mut out = format!(
        "\nStock Data Table (last {} of {} rows)\n",
        shown,
        frame.len()
    );

    let cells: Vec<(String, Vec<String>)> = frame
        .tail(rows)
        .map(|(date, row)| {
            (
                date.to_string(),
                row.iter().map(|v| cell(*v, ValueFormat::Price)).collect(),
            )
        })
        .collect();

    let widths: Vec<usize> = frame
        .tickers()
        .iter()
        .enumerate()
        .map(|(idx, ticker)| {
            cells
                .iter()
                .map(|(_, row)| row[idx].len())
                .chain(std::iter::once(ticker.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    out.push_str(&format!("  {:<10}", "Date"));
    for (ticker, width) in frame.tickers().iter().zip(&widths) {
        out.push_str(&format!("  {:>width$}", ticker, width = *width));
    }
    out.push('\n');

    for (date, row) in &cells {
        out.push_str(&format!("  {:<10}", date));
        for (value, width) in row.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", value, width = *width));
        }
        out.push('\n');
    }

    out
}
