//! Inline SVG charts: line, bar and pie.

use std::f64::consts::PI;

use chrono::NaiveDate;

use super::format::{escape, ValueFormat};

const WIDTH: i32 = 576;
const HEIGHT: i32 = 288;
const PADDING: f64 = 36.0;
const LEFT_MARGIN: f64 = 64.0;
const Y_TICKS: usize = 5;
const X_LABELS: usize = 6;
const PALETTE: [&str; 8] = [
    "#348dc1", "#ff9933", "#4fa487", "#af4b64", "#8c6bb1", "#d4a017", "#5f9ea0", "#8c8c8c",
];

/// One line of a line chart, aligned with the chart's dates.
#[derive(Debug, Clone)]
pub struct ChartSeries<'a> {
    pub label: &'a str,
    pub values: Vec<Option<f64>>,
}

fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn svg_header() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}}</style>"#,
        w = WIDTH,
        h = HEIGHT
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn wrap_plot(title: &str, svg_body: String) -> String {
    format!(
        r#"<div class="pa-plot"><div class="pa-plot-title">{title}</div>{svg}</div>"#,
        title = escape(title),
        svg = svg_body
    )
}

fn empty_plot(title: &str) -> String {
    wrap_plot(
        title,
        format!(
            r#"{header}<text x="{x}" y="{y}" text-anchor="middle">No data</text>{footer}"#,
            header = svg_header(),
            x = WIDTH / 2,
            y = HEIGHT / 2,
            footer = svg_footer()
        ),
    )
}

/// Min/max over all finite values, widened when flat.
fn extent<'a>(values: impl Iterator<Item = &'a f64>, include_zero: bool) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;

    for value in values.filter(|v| v.is_finite()) {
        min_v = min_v.min(*value);
        max_v = max_v.max(*value);
    }

    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }

    if include_zero {
        min_v = min_v.min(0.0);
        max_v = max_v.max(0.0);
    }

    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        min_v -= adjust;
        max_v += adjust;
    }

    Some((min_v, max_v))
}

fn scale_y(value: f64, min_v: f64, max_v: f64) -> f64 {
    let height = HEIGHT as f64;
    let inner_height = height - 2.0 * PADDING;
    let norm = (value - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * inner_height
}

fn x_positions(len: usize) -> Vec<f64> {
    let right = WIDTH as f64 - PADDING;
    match len {
        0 => Vec::new(),
        1 => vec![(LEFT_MARGIN + right) / 2.0],
        _ => {
            let step = (right - LEFT_MARGIN) / (len - 1) as f64;
            (0..len).map(|i| LEFT_MARGIN + step * i as f64).collect()
        }
    }
}

fn add_value_axis(svg: &mut String, min_v: f64, max_v: f64, format: ValueFormat) {
    let right = WIDTH as f64 - PADDING;
    for i in 0..Y_TICKS {
        let value = min_v + (max_v - min_v) * i as f64 / (Y_TICKS - 1) as f64;
        let y = scale_y(value, min_v, max_v);
        svg.push_str(&format!(
            r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#eeeeee" stroke-width="0.5" />"##,
            x1 = LEFT_MARGIN,
            x2 = right,
            y = y
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label}</text>"#,
            x = LEFT_MARGIN - 6.0,
            y = y + 3.0,
            label = format.axis(value)
        ));
    }
}

fn add_time_axis(svg: &mut String, dates: &[NaiveDate], xs: &[f64]) {
    let axis_y = HEIGHT as f64 - PADDING + 5.0;
    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = LEFT_MARGIN,
        x2 = WIDTH as f64 - PADDING,
        y = axis_y
    ));

    let step = (dates.len() / X_LABELS).max(1);
    for (idx, date) in dates.iter().enumerate().step_by(step) {
        let x = xs[idx];
        svg.push_str(&format!(
            r##"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#ccc" stroke-width="1" />"##,
            x = x,
            y1 = axis_y,
            y2 = axis_y + 4.0
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = x,
            y = axis_y + 16.0,
            label = date.format("%Y-%m-%d")
        ));
    }
}

fn add_legend(svg: &mut String, labels: &[&str]) {
    let x = LEFT_MARGIN + 10.0;
    let mut y = PADDING + 4.0;
    for (idx, label) in labels.iter().enumerate() {
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{color}" stroke-width="2" />"#,
            x1 = x,
            x2 = x + 20.0,
            y = y - 4.0,
            color = color(idx)
        ));
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label}</text>"##,
            x = x + 26.0,
            y = y,
            label = escape(label)
        ));
        y += 14.0;
    }
}

/// Draw one or more series over a shared date axis.
///
/// Missing values are skipped; the line joins the neighbouring points.
pub fn line_chart(
    title: &str,
    dates: &[NaiveDate],
    series: &[ChartSeries<'_>],
    format: ValueFormat,
) -> String {
    let all_values = series.iter().flat_map(|s| s.values.iter().flatten());
    let (min_v, max_v) = match extent(all_values, false) {
        Some(extent) if !dates.is_empty() => extent,
        _ => return empty_plot(title),
    };

    let xs = x_positions(dates.len());
    let mut svg = svg_header();
    add_value_axis(&mut svg, min_v, max_v, format);

    for (idx, line) in series.iter().enumerate() {
        let points = line
            .values
            .iter()
            .zip(xs.iter())
            .filter_map(|(value, x)| value.filter(|v| v.is_finite()).map(|v| (*x, v)))
            .map(|(x, v)| format!("{:.2},{:.2}", x, scale_y(v, min_v, max_v)))
            .collect::<Vec<_>>()
            .join(" ");
        if points.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="1.2" points="{points}" />"#,
            color = color(idx),
            points = points
        ));
    }

    add_time_axis(&mut svg, dates, &xs);
    if series.len() > 1 {
        let labels: Vec<&str> = series.iter().map(|s| s.label).collect();
        add_legend(&mut svg, &labels);
    }

    svg.push_str(svg_footer());
    wrap_plot(title, svg)
}

/// Draw one bar per label, green above zero and red below.
pub fn bar_chart(title: &str, labels: &[String], values: &[f64], format: ValueFormat) -> String {
    let (min_v, max_v) = match extent(values.iter(), true) {
        Some(extent) if !labels.is_empty() => extent,
        _ => return empty_plot(title),
    };

    let right = WIDTH as f64 - PADDING;
    let slot = (right - LEFT_MARGIN) / labels.len() as f64;
    let bar_width = slot * 0.6;
    let zero = scale_y(0.0, min_v, max_v);

    let mut svg = svg_header();
    add_value_axis(&mut svg, min_v, max_v, format);

    for (i, (label, value)) in labels.iter().zip(values).enumerate() {
        let x_center = LEFT_MARGIN + slot * (i as f64 + 0.5);
        if value.is_finite() {
            let y = scale_y(*value, min_v, max_v);
            let (top, bottom) = if y < zero { (y, zero) } else { (zero, y) };
            let fill = if *value >= 0.0 { "#4fa487" } else { "#af4b64" };
            svg.push_str(&format!(
                r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}"><title>{tip}</title></rect>"#,
                x = x_center - bar_width / 2.0,
                y = top,
                w = bar_width,
                h = bottom - top,
                fill = fill,
                tip = format.label(*value)
            ));
        }
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = x_center,
            y = HEIGHT as f64 - PADDING + 16.0,
            label = escape(label)
        ));
    }

    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = LEFT_MARGIN,
        x2 = right,
        y = zero
    ));

    svg.push_str(svg_footer());
    wrap_plot(title, svg)
}

fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy - r * angle.sin())
}

/// Draw a pie of positive shares, starting at twelve o'clock and running
/// counter-clockwise. Non-positive shares are left out.
pub fn pie_chart(title: &str, slices: &[(String, f64)]) -> String {
    let shown: Vec<&(String, f64)> = slices
        .iter()
        .filter(|(_, v)| v.is_finite() && *v > 0.0)
        .collect();
    let total: f64 = shown.iter().map(|(_, v)| v).sum();
    if shown.is_empty() || total <= 0.0 {
        return empty_plot(title);
    }

    let cx = WIDTH as f64 / 2.0;
    let cy = HEIGHT as f64 / 2.0;
    let r = HEIGHT as f64 / 2.0 - PADDING;

    let mut svg = svg_header();
    let mut start = PI / 2.0;

    for (idx, (label, value)) in shown.iter().enumerate() {
        let share = value / total;
        let sweep = share * 2.0 * PI;
        let end = start + sweep;

        if shown.len() == 1 {
            svg.push_str(&format!(
                r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{fill}" />"#,
                cx = cx,
                cy = cy,
                r = r,
                fill = color(idx)
            ));
        } else {
            let (x1, y1) = polar(cx, cy, r, start);
            let (x2, y2) = polar(cx, cy, r, end);
            let large_arc = if sweep > PI { 1 } else { 0 };
            svg.push_str(&format!(
                r##"<path d="M {cx:.2} {cy:.2} L {x1:.2} {y1:.2} A {r:.2} {r:.2} 0 {large} 0 {x2:.2} {y2:.2} Z" fill="{fill}" stroke="#fff" stroke-width="1" />"##,
                cx = cx,
                cy = cy,
                x1 = x1,
                y1 = y1,
                r = r,
                large = large_arc,
                x2 = x2,
                y2 = y2,
                fill = color(idx)
            ));
        }

        let mid = start + sweep / 2.0;
        let (px, py) = polar(cx, cy, r * 0.6, mid);
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" fill="#fff">{pct}</text>"##,
            x = px,
            y = py + 3.0,
            pct = ValueFormat::Share.label(share)
        ));
        let (lx, ly) = polar(cx, cy, r * 1.12, mid);
        let anchor = if lx >= cx { "start" } else { "end" };
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="{anchor}" fill="#333">{label}</text>"##,
            x = lx,
            y = ly + 3.0,
            anchor = anchor,
            label = escape(label)
        ));

        start = end;
    }

    svg.push_str(svg_footer());
    wrap_plot(title, svg)
}
