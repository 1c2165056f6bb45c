use clap::Args;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use risk_analytics_core::regulatory::allowance::{self, AllowanceInput};
use risk_analytics_core::regulatory::liquidity::{self, CoverageRatio, LcrInput};
use risk_analytics_core::regulatory::market_impact::{self, MarketImpactInput};
use risk_analytics_core::regulatory::stress::{self, StressCapitalInput};
use risk_analytics_core::types::Money;

use super::{envelope, CommandResult};
use crate::input;

/// Arguments for the liquidity coverage ratio
#[derive(Args)]
pub struct LcrArgs {
    /// Path to JSON/YAML input file: either `hqla` + `net_outflows`, or an
    /// HQLA portfolio with categorised cash flows
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for order-book market impact
#[derive(Args)]
pub struct MarketImpactArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for stressed capital ratios
#[derive(Args)]
pub struct StressCapitalArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the credit loss allowance
#[derive(Args)]
pub struct AllowanceArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum LcrRequest {
    Totals { hqla: Money, net_outflows: Money },
    Flows(LcrInput),
}

#[derive(Debug, Serialize)]
struct LcrTotalsOutput {
    lcr_ratio: CoverageRatio,
}

pub fn run_lcr(args: LcrArgs) -> CommandResult {
    let req: LcrRequest = input::read_input(args.input.as_deref(), "LCR calculation")?;
    let started = Instant::now();
    match &req {
        LcrRequest::Totals { hqla, net_outflows } => {
            let lcr_ratio = liquidity::liquidity_coverage_ratio(*hqla, *net_outflows)?;
            envelope(
                "LCR = HQLA / net 30-day outflows",
                &req,
                Vec::new(),
                started,
                LcrTotalsOutput { lcr_ratio },
            )
        }
        LcrRequest::Flows(li) => {
            let result = liquidity::lcr_from_flows(li)?;
            let warnings = result.warnings.clone();
            envelope(
                "Basel III LCR (HQLA haircuts and caps, 75% inflow cap)",
                li,
                warnings,
                started,
                result,
            )
        }
    }
}

pub fn run_market_impact(args: MarketImpactArgs) -> CommandResult {
    let mi: MarketImpactInput = input::read_input(args.input.as_deref(), "market impact")?;
    let started = Instant::now();
    let result = market_impact::market_impact(&mi)?;
    envelope(
        "Order-book walk: VWAP versus best price",
        &mi,
        Vec::new(),
        started,
        result,
    )
}

pub fn run_stress_capital(args: StressCapitalArgs) -> CommandResult {
    let si: StressCapitalInput = input::read_input(args.input.as_deref(), "stress capital")?;
    let started = Instant::now();
    let result = stress::stress_capital_ratios(&si)?;
    envelope(
        "Post-stress capital ratios per tier",
        &si,
        Vec::new(),
        started,
        result,
    )
}

pub fn run_allowance(args: AllowanceArgs) -> CommandResult {
    let ai: AllowanceInput = input::read_input(args.input.as_deref(), "allowance")?;
    let started = Instant::now();
    let result = allowance::compute_allowance(&ai)?;
    envelope(
        "Allowance = sum of segment ECL + qualitative overlays",
        &ai,
        Vec::new(),
        started,
        result,
    )
}
