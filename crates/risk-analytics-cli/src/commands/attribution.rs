use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use risk_analytics_core::attribution::brinson::{self, BrinsonInput};
use risk_analytics_core::attribution::fixed_income::{self, DurationAttributionInput};
use risk_analytics_core::attribution::returns::{self, ReturnDecomposition};
use risk_analytics_core::types::{Money, Rate};

use super::{envelope, CommandResult};
use crate::input;

/// Arguments for holding-period total return
#[derive(Args)]
pub struct TotalReturnArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for single-period Brinson attribution
#[derive(Args)]
pub struct BrinsonArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for multi-period linked attribution
#[derive(Args)]
pub struct LinkedAttributionArgs {
    /// Path to JSON/YAML input file with a `periods` list
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for fixed-income duration attribution
#[derive(Args)]
pub struct DurationAttributionArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TotalReturnRequest {
    begin_mv: Money,
    end_mv: Money,
    #[serde(default)]
    income: Money,
    #[serde(default)]
    costs: Money,
    /// When either component is given the total is also decomposed.
    #[serde(default)]
    income_return: Option<Rate>,
    #[serde(default)]
    currency_return: Option<Rate>,
}

#[derive(Debug, Serialize)]
struct TotalReturnOutput {
    total_return: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    decomposition: Option<ReturnDecomposition>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkedAttributionRequest {
    periods: Vec<BrinsonInput>,
}

pub fn run_total_return(args: TotalReturnArgs) -> CommandResult {
    let req: TotalReturnRequest = input::read_input(args.input.as_deref(), "total return")?;
    let started = Instant::now();
    let total_return = returns::total_return(req.begin_mv, req.end_mv, req.income, req.costs)?;
    let decomposition = if req.income_return.is_some() || req.currency_return.is_some() {
        Some(returns::decompose_return(
            total_return,
            req.income_return.unwrap_or(Decimal::ZERO),
            req.currency_return.unwrap_or(Decimal::ZERO),
        ))
    } else {
        None
    };
    envelope(
        "Holding-period total return",
        &req,
        Vec::new(),
        started,
        TotalReturnOutput {
            total_return,
            decomposition,
        },
    )
}

pub fn run_brinson(args: BrinsonArgs) -> CommandResult {
    let bi: BrinsonInput = input::read_input(args.input.as_deref(), "Brinson attribution")?;
    let started = Instant::now();
    let result = brinson::brinson_attribution(&bi)?;
    let warnings = result.warnings.clone();
    envelope(
        "Brinson-Hood-Beebower attribution",
        &bi,
        warnings,
        started,
        result,
    )
}

pub fn run_linked_attribution(args: LinkedAttributionArgs) -> CommandResult {
    let req: LinkedAttributionRequest =
        input::read_input(args.input.as_deref(), "linked attribution")?;
    let started = Instant::now();
    let result = brinson::link_attribution(&req.periods)?;
    envelope(
        "Carino-linked multi-period Brinson attribution",
        &serde_json::json!({ "periods": req.periods.len() }),
        Vec::new(),
        started,
        result,
    )
}

pub fn run_duration_attribution(args: DurationAttributionArgs) -> CommandResult {
    let di: DurationAttributionInput =
        input::read_input(args.input.as_deref(), "duration attribution")?;
    let started = Instant::now();
    let result = fixed_income::duration_attribution(&di);
    envelope(
        "Duration and spread attribution",
        &di,
        Vec::new(),
        started,
        result,
    )
}
