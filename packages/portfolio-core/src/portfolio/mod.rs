//! Portfolio analytics module.
//!
//! Provides daily and portfolio returns, cumulative growth and risk metrics.

mod metrics;
mod returns;

pub use metrics::{
    calculate_metrics, cumulative_sum_drawdown, max_drawdown, series_metrics, sharpe_ratio,
    volatility, DrawdownMethod, MetricOptions, PerformanceMetrics, TRADING_DAYS_PER_YEAR,
};
pub use returns::{
    average_returns, cumulative_returns, pct_change, portfolio_returns, AverageReturn,
};
