//! Standalone HTML report with inline SVG charts.

use super::chart::{bar_chart, line_chart, pie_chart, ChartSeries};
use super::format::{cell, escape, ValueFormat};
use crate::analysis::{AnalysisReport, PortfolioSection};
use crate::types::Frame;

const DEFAULT_TITLE: &str = "Stock Portfolio Analyzer";
const VERSION: &str = env!("CARGO_PKG_VERSION");

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style>
body{font-family:Arial,sans-serif;margin:24px auto;max-width:960px;color:#333}
h1{font-size:24px;margin-bottom:4px}
h2{font-size:18px;margin-top:28px;border-bottom:1px solid #eee;padding-bottom:4px}
.pa-meta{color:#888;font-size:12px}
.pa-plot-title{font-size:13px;color:#555;margin:8px 0}
.pa-error{background:#fdecea;border:1px solid #f5c2c0;color:#a12622;padding:10px 14px;border-radius:4px}
.pa-metrics td{padding:4px 16px 4px 0}
.pa-table{max-height:360px;overflow:auto;border:1px solid #eee}
.pa-table table{border-collapse:collapse;width:100%;font-size:12px}
.pa-table th,.pa-table td{padding:3px 8px;text-align:right;border-bottom:1px solid #f3f3f3}
.pa-table th:first-child,.pa-table td:first-child{text-align:left}
footer{margin-top:32px;color:#aaa;font-size:11px}
</style>
</head>
<body>
<h1>{{title}}</h1>
<div class="pa-meta">{{meta}}</div>
{{body}}
<footer>Generated by portfolio-analyzer v{{version}}</footer>
</body>
</html>
"#;

/// Options for the HTML renderer.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Page title
    pub title: String,
    /// Limit the data table to the last `n` rows (`None` shows all)
    pub table_rows: Option<usize>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            table_rows: None,
        }
    }
}

impl HtmlOptions {
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_table_rows(mut self, rows: usize) -> Self {
        self.table_rows = Some(rows);
        self
    }
}

/// Render an analysis as a complete HTML page.
pub fn render_html(report: &AnalysisReport, options: &HtmlOptions) -> String {
    let mut body = String::new();

    body.push_str("<h2>Stock Prices</h2>");
    body.push_str(&frame_chart("Closing prices", &report.prices, ValueFormat::Price));

    body.push_str("<h2>Daily Returns</h2>");
    body.push_str(&frame_chart(
        "Daily percentage change",
        &report.daily_returns,
        ValueFormat::Percent,
    ));

    match report.portfolio.section() {
        Some(section) => body.push_str(&portfolio_sections(report, section, options)),
        None => {
            let message = report.portfolio.message().unwrap_or_default();
            body.push_str(&error_box(message));
        }
    }

    TEMPLATE
        .replace("{{title}}", &escape(&options.title))
        .replace("{{meta}}", &meta_line(report))
        .replace("{{version}}", VERSION)
        .replace("{{body}}", &body)
}

/// Render an inline error as a complete HTML page.
pub fn render_html_error(message: &str, options: &HtmlOptions) -> String {
    TEMPLATE
        .replace("{{title}}", &escape(&options.title))
        .replace("{{meta}}", "")
        .replace("{{version}}", VERSION)
        .replace("{{body}}", &error_box(message))
}

fn error_box(message: &str) -> String {
    format!(r#"<div class="pa-error">{}</div>"#, escape(message))
}

fn meta_line(report: &AnalysisReport) -> String {
    let request = &report.request;
    format!(
        "{} &middot; {} to {} &middot; {} trading days",
        escape(&request.tickers.join(", ")),
        request.start,
        request.end,
        report.prices.len()
    )
}

fn frame_chart(title: &str, frame: &Frame, format: ValueFormat) -> String {
    let series: Vec<ChartSeries<'_>> = frame
        .tickers()
        .iter()
        .enumerate()
        .map(|(idx, ticker)| ChartSeries {
            label: ticker,
            values: frame.column(idx),
        })
        .collect();
    line_chart(title, frame.dates(), &series, format)
}

fn portfolio_sections(
    report: &AnalysisReport,
    section: &PortfolioSection,
    options: &HtmlOptions,
) -> String {
    let mut html = String::new();
    let metrics = &section.metrics;

    html.push_str("<h2>Performance Metrics</h2>");
    html.push_str(r#"<table class="pa-metrics">"#);
    for (label, value) in [
        ("Sharpe Ratio", format!("{:.2}", metrics.sharpe_ratio)),
        ("Maximum Drawdown", ValueFormat::Percent.label(metrics.max_drawdown)),
        ("Annualized Volatility", ValueFormat::Percent.label(metrics.volatility)),
        ("Total Return", ValueFormat::Percent.label(metrics.total_return)),
    ] {
        html.push_str(&format!(
            "<tr><td><em>{}:</em></td><td><strong>{}</strong></td></tr>",
            label, value
        ));
    }
    html.push_str("</table>");

    html.push_str("<h2>Cumulative Portfolio Returns</h2>");
    let cumulative = &section.cumulative_returns;
    html.push_str(&line_chart(
        "Growth of 1 invested",
        &cumulative.dates,
        &[ChartSeries {
            label: "Portfolio",
            values: cumulative.values.iter().copied().map(Some).collect(),
        }],
        ValueFormat::Ratio,
    ));

    html.push_str("<h2>Stock Data Table</h2>");
    html.push_str(&data_table(&report.prices, options.table_rows));

    html.push_str("<h2>Average Daily Returns</h2>");
    let labels: Vec<String> = section
        .average_daily_returns
        .iter()
        .map(|a| a.ticker.clone())
        .collect();
    let means: Vec<f64> = section
        .average_daily_returns
        .iter()
        .map(|a| a.mean.unwrap_or(f64::NAN))
        .collect();
    html.push_str(&bar_chart(
        "Mean daily return per ticker",
        &labels,
        &means,
        ValueFormat::Percent,
    ));

    html.push_str("<h2>Portfolio Weights</h2>");
    let slices: Vec<(String, f64)> = section
        .weights
        .iter()
        .map(|w| (w.ticker.clone(), w.weight))
        .collect();
    html.push_str(&pie_chart("Share of portfolio", &slices));

    html
}

fn data_table(frame: &Frame, rows: Option<usize>) -> String {
    let mut html = String::from(r#"<div class="pa-table"><table><thead><tr><th>Date</th>"#);
    for ticker in frame.tickers() {
        html.push_str(&format!("<th>{}</th>", escape(ticker)));
    }
    html.push_str("</tr></thead><tbody>");

    for (date, row) in frame.tail(rows.unwrap_or(frame.len())) {
        html.push_str(&format!("<tr><td>{}</td>", date));
        for value in row {
            html.push_str(&format!("<td>{}</td>", cell(*value, ValueFormat::Price)));
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table></div>");
    html
}
