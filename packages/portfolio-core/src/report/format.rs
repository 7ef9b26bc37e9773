//! Number formatting and escaping shared by the renderers.

/// How a value is shown on axes and in labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Prices: `123.45`
    Price,
    /// Returns and risk figures: `-12.34%`
    Percent,
    /// Plain ratios and growth factors: `1.234`
    Ratio,
    /// Portfolio shares: `33.0%`
    Share,
}

impl ValueFormat {
    /// Full-precision label.
    pub fn label(self, value: f64) -> String {
        if !value.is_finite() {
            return "n/a".to_string();
        }
        match self {
            ValueFormat::Price => format!("{:.2}", value),
            ValueFormat::Percent => format!("{:.2}%", value * 100.0),
            ValueFormat::Ratio => format!("{:.3}", value),
            ValueFormat::Share => format!("{:.1}%", value * 100.0),
        }
    }

    /// Compact label for axis ticks.
    pub fn axis(self, value: f64) -> String {
        match self {
            ValueFormat::Percent => format!("{:.1}%", value * 100.0),
            ValueFormat::Ratio => format!("{:.2}", value),
            _ => self.label(value),
        }
    }
}

/// Format an optional cell, blank when missing.
pub fn cell(value: Option<f64>, format: ValueFormat) -> String {
    value.map(|v| format.label(v)).unwrap_or_default()
}

/// Escape text for HTML and SVG.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(ValueFormat::Price.label(123.456), "123.46");
        assert_eq!(ValueFormat::Percent.label(-0.123456), "-12.35%");
        assert_eq!(ValueFormat::Ratio.label(1.23456), "1.235");
        assert_eq!(ValueFormat::Share.label(0.33), "33.0%");
        assert_eq!(ValueFormat::Percent.label(f64::NAN), "n/a");
    }

    #[test]
    fn test_cell() {
        assert_eq!(cell(None, ValueFormat::Price), "");
        assert_eq!(cell(Some(1.0), ValueFormat::Price), "1.00");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape("AAPL"), "AAPL");
    }
}
