use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use risk_analytics_core::performance::benchmark;
use risk_analytics_core::performance::ratios;
use risk_analytics_core::performance::summary::{self, RiskAdjustedInput};
use risk_analytics_core::types::Rate;

use super::{envelope, CommandResult};
use crate::input;

/// Arguments for per-period Sharpe and Sortino ratios
#[derive(Args)]
pub struct RatiosArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for maximum drawdown
#[derive(Args)]
pub struct DrawdownArgs {
    /// Path to JSON/YAML input file with `values` or `returns`
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for active return, tracking error and information ratio
#[derive(Args)]
pub struct BenchmarkArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the annualised risk-adjusted summary
#[derive(Args)]
pub struct RiskSummaryArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RatiosRequest {
    returns: Vec<Rate>,
    #[serde(default)]
    risk_free_rate: Rate,
}

#[derive(Debug, Serialize)]
struct RatiosOutput {
    sharpe_ratio: Decimal,
    sortino_ratio: Decimal,
    num_periods: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct DrawdownRequest {
    /// Cumulative value levels (wealth index or NAV)
    #[serde(default)]
    values: Option<Vec<Decimal>>,
    /// Period returns compounded from 1
    #[serde(default)]
    returns: Option<Vec<Rate>>,
}

#[derive(Debug, Serialize)]
struct DrawdownOutput {
    max_drawdown: Rate,
}

#[derive(Debug, Serialize, Deserialize)]
struct BenchmarkRequest {
    portfolio_returns: Vec<Rate>,
    benchmark_returns: Vec<Rate>,
}

#[derive(Debug, Serialize)]
struct BenchmarkOutput {
    active_returns: Vec<Rate>,
    tracking_error: Rate,
    information_ratio: Decimal,
    beta: Decimal,
}

pub fn run_ratios(args: RatiosArgs) -> CommandResult {
    let req: RatiosRequest = input::read_input(args.input.as_deref(), "Sharpe/Sortino")?;
    let started = Instant::now();
    let result = RatiosOutput {
        sharpe_ratio: ratios::sharpe_ratio(&req.returns, req.risk_free_rate)?,
        sortino_ratio: ratios::sortino_ratio(&req.returns, req.risk_free_rate)?,
        num_periods: req.returns.len(),
    };
    envelope(
        "Sharpe (sample sd) and Sortino (downside deviation) per period",
        &req,
        Vec::new(),
        started,
        result,
    )
}

pub fn run_drawdown(args: DrawdownArgs) -> CommandResult {
    let req: DrawdownRequest = input::read_input(args.input.as_deref(), "max drawdown")?;
    let started = Instant::now();
    let max_drawdown = match (&req.values, &req.returns) {
        (Some(values), None) => ratios::max_drawdown(values)?,
        (None, Some(returns)) => ratios::max_drawdown_from_returns(returns)?,
        _ => return Err("max drawdown needs exactly one of `values` or `returns`".into()),
    };
    envelope(
        "Peak-to-trough maximum drawdown",
        &req,
        Vec::new(),
        started,
        DrawdownOutput { max_drawdown },
    )
}

pub fn run_benchmark(args: BenchmarkArgs) -> CommandResult {
    let req: BenchmarkRequest = input::read_input(args.input.as_deref(), "benchmark comparison")?;
    let started = Instant::now();
    let active_returns = benchmark::active_returns(&req.portfolio_returns, &req.benchmark_returns)?;
    let result = BenchmarkOutput {
        tracking_error: benchmark::tracking_error(&active_returns)?,
        information_ratio: benchmark::information_ratio(&active_returns)?,
        beta: benchmark::beta(&req.portfolio_returns, &req.benchmark_returns)?,
        active_returns,
    };
    envelope(
        "Active return, tracking error, information ratio and beta",
        &req,
        Vec::new(),
        started,
        result,
    )
}

pub fn run_risk_summary(args: RiskSummaryArgs) -> CommandResult {
    let ri: RiskAdjustedInput = input::read_input(args.input.as_deref(), "risk-adjusted summary")?;
    let started = Instant::now();
    let result = summary::risk_adjusted_summary(&ri)?;
    envelope(
        "Annualised risk-adjusted return summary",
        &ri,
        Vec::new(),
        started,
        result,
    )
}
