//! Portfolio Analyzer CLI.
//!
//! Fetches daily prices for a set of tickers, computes daily and weighted
//! portfolio returns and reports the Sharpe ratio, max drawdown and
//! volatility as text, JSON or HTML.

mod config;
mod market_data;
mod session;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use portfolio_core::DrawdownMethod;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::AppConfig;
use market_data::YahooFinance;
use session::{Inputs, OutputFormat, Session};

#[derive(Parser)]
#[command(name = "portfolio-analyzer")]
#[command(about = "Stock portfolio analyzer - returns, Sharpe ratio, drawdown and volatility")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a portfolio once
    Analyze(RunArgs),
    /// Prompt for inputs and rerun the analysis on every submission
    Interactive(RunArgs),
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Tickers (comma-separated)
    #[arg(short, long)]
    tickers: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(short, long)]
    start: Option<String>,
    /// End date (YYYY-MM-DD, exclusive; defaults to today)
    #[arg(short, long)]
    end: Option<String>,
    /// Weights (comma-separated, one per ticker, summing to 1)
    #[arg(short, long)]
    weights: Option<String>,
    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Max drawdown measure
    #[arg(long, value_enum)]
    drawdown_method: Option<DrawdownMethod>,
    /// Annual risk-free rate (0.04 = 4%)
    #[arg(long)]
    risk_free_rate: Option<f64>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for reports
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => {
            let config = AppConfig::load()?;
            let (session, inputs) = build_session(&config, args)?;
            session.run_once(&inputs, &mut io::stdout()).await
        }
        Commands::Interactive(args) => {
            let config = AppConfig::load()?;
            let (session, inputs) = build_session(&config, args)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session.interactive(inputs, stdin, &mut io::stdout()).await
        }
        Commands::Config { action } => handle_config(action),
    }
}

/// Merge command-line arguments over the config file.
fn build_session(config: &AppConfig, args: RunArgs) -> Result<(Session<YahooFinance>, Inputs)> {
    let defaults = &config.defaults;
    let today = chrono::Local::now().date_naive().to_string();

    let inputs = Inputs {
        tickers: args.tickers.unwrap_or_else(|| defaults.tickers.clone()),
        start: args.start.unwrap_or_else(|| defaults.start_date.clone()),
        end: args
            .end
            .or_else(|| defaults.end_date.clone())
            .unwrap_or(today),
        weights: args.weights.unwrap_or_else(|| defaults.weights.clone()),
    };

    let mut options = config.metrics.options();
    if let Some(method) = args.drawdown_method {
        options.drawdown_method = method;
    }
    if let Some(rate) = args.risk_free_rate {
        options.risk_free_rate = rate;
    }

    let format = args
        .format
        .unwrap_or_else(|| OutputFormat::from_config(&config.report.format));

    let source = YahooFinance::new(&config.provider)?;
    tracing::debug!(base_url = source.base_url(), ?format, "session configured");

    let session =
        Session::new(source, options, format, config.report.table_rows).with_output(args.output);
    Ok((session, inputs))
}

fn handle_config(action: ConfigAction) -> Result<()> {
    let path = AppConfig::default_path();

    match action {
        ConfigAction::Show => {
            let config = AppConfig::load_from_path(&path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force } => {
            AppConfig::default().write_to_path(&path, force)?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigAction::Path => println!("{}", path.display()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> RunArgs {
        let argv = ["portfolio-analyzer", "analyze"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Analyze(args) => args,
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_drawdown_method_flag() {
        let args = run_args(&["--drawdown-method", "peak-to-trough"]);
        assert_eq!(args.drawdown_method, Some(DrawdownMethod::PeakToTrough));

        let args = run_args(&["--drawdown-method", "cumulative-sum-range"]);
        assert_eq!(args.drawdown_method, Some(DrawdownMethod::CumulativeSumRange));

        assert!(run_args(&[]).drawdown_method.is_none());
    }

    #[test]
    fn test_unknown_drawdown_method_rejected() {
        let argv = ["portfolio-analyzer", "analyze", "--drawdown-method", "running-max"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = run_args(&[
            "--tickers",
            "spy",
            "--drawdown-method",
            "peak-to-trough",
            "--risk-free-rate",
            "0.04",
        ]);
        let (_, inputs) = build_session(&AppConfig::default(), args).unwrap();
        assert_eq!(inputs.tickers, "spy");
        assert_eq!(inputs.weights, "0.33, 0.33, 0.34");
    }
}
