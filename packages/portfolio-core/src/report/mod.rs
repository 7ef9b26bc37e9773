//! Report rendering.
//!
//! Three renderings of an [`AnalysisReport`]:
//!
//! - **Text**: terminal summary with metrics and the recent price table
//! - **JSON**: the report inside an [`ApiResponse`] envelope
//! - **HTML**: standalone page with SVG line, bar and pie charts

mod chart;
mod format;
mod html;
mod text;

pub use chart::{bar_chart, line_chart, pie_chart, ChartSeries};
pub use format::{escape, ValueFormat};
pub use html::{render_html, render_html_error, HtmlOptions};
pub use text::{render_text, TextOptions};

use crate::analysis::AnalysisReport;
use crate::types::ApiResponse;
use crate::Result;

/// Render an analysis as pretty-printed JSON.
pub fn render_json(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ApiResponse::ok(report))?)
}

/// Render an inline error as pretty-printed JSON.
pub fn render_json_error(message: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ApiResponse::<()>::err(message))?)
}
