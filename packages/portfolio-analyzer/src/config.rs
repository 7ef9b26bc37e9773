//! Application configuration.
//!
//! Read from `$PORTFOLIO_ANALYZER_CONFIG` when set, otherwise from
//! `config.toml` in the platform config directory. A missing file means
//! defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use portfolio_core::{DrawdownMethod, MetricOptions, TRADING_DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "PORTFOLIO_ANALYZER_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub defaults: DefaultsConfig,
    pub provider: ProviderConfig,
    pub metrics: MetricsConfig,
    pub report: ReportConfig,
}

/// Inputs used when the command line leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub tickers: String,
    pub weights: String,
    pub start_date: String,
    /// Empty means today.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tickers: "AAPL, MSFT, GOOGL".to_string(),
            weights: "0.33, 0.33, 0.34".to_string(),
            start_date: "2020-01-01".to_string(),
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
    pub drawdown_method: DrawdownMethod,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            periods_per_year: TRADING_DAYS_PER_YEAR as u32,
            drawdown_method: DrawdownMethod::default(),
        }
    }
}

impl MetricsConfig {
    pub fn options(&self) -> MetricOptions {
        MetricOptions {
            risk_free_rate: self.risk_free_rate,
            periods_per_year: f64::from(self.periods_per_year),
            drawdown_method: self.drawdown_method,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// `text`, `json` or `html`
    pub format: String,
    /// Rows of the price table shown in text and HTML reports
    pub table_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            table_rows: 10,
        }
    }
}

impl AppConfig {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("com", "adolago", "portfolio-analyzer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("portfolio-analyzer.toml"))
    }

    /// Load config from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Write the config to `path`, refusing to overwrite unless `force`.
    pub fn write_to_path(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            );
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
