use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use risk_analytics_core::credit::capital;
use risk_analytics_core::credit::concentration::{self, GroupedConcentration, TopNConcentration};
use risk_analytics_core::credit::exposure;
use risk_analytics_core::credit::lgd::{self, Seniority, WorkoutLgdInput};
use risk_analytics_core::credit::migration::{self, MigrationPnlInput};
use risk_analytics_core::credit::reference::{self, InMemoryReferenceData, ReferenceData};
use risk_analytics_core::types::{Exposure, Money, Rate};

use super::{envelope, CommandResult};
use crate::input;

/// Arguments for EL / UL / RAROC
#[derive(Args)]
pub struct CreditLossArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for exposure at default
#[derive(Args)]
pub struct EadArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for workout LGD
#[derive(Args)]
pub struct WorkoutLgdArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for market LGD lookup
#[derive(Args)]
pub struct MarketLgdArgs {
    /// Path to JSON/YAML input file with `rating` and optional `seniority`
    #[arg(long)]
    pub input: Option<String>,

    /// Reference data document holding `lgd_table`
    #[arg(long)]
    pub reference: String,
}

/// Arguments for concentration metrics
#[derive(Args)]
pub struct ConcentrationArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for rating-migration P&L
#[derive(Args)]
pub struct MigrationArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Reference data document holding `transition_matrices`
    #[arg(long)]
    pub reference: String,

    /// Transition matrix source (defaults to SP)
    #[arg(long)]
    pub source: Option<String>,
}

/// Arguments for cumulative default probability
#[derive(Args)]
pub struct CumulativeDefaultArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Reference data document holding `transition_matrices`
    #[arg(long)]
    pub reference: String,

    /// Transition matrix source (defaults to SP)
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CreditLossRequest {
    pd: Rate,
    lgd: Rate,
    ead: Money,
    #[serde(default)]
    lgd_volatility: Option<Rate>,
    /// RAROC is reported when both revenue and economic capital are given.
    #[serde(default)]
    revenue: Option<Money>,
    #[serde(default)]
    operating_cost: Money,
    #[serde(default)]
    economic_capital: Option<Money>,
}

#[derive(Debug, Serialize)]
struct CreditLossOutput {
    expected_loss: Money,
    unexpected_loss: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    raroc: Option<Rate>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EadRequest {
    /// On-balance outstanding; when given the facility fields are ignored.
    #[serde(default)]
    outstanding: Option<Money>,
    #[serde(default)]
    committed: Money,
    #[serde(default)]
    drawn: Money,
    #[serde(default)]
    ccf: Option<Rate>,
}

#[derive(Debug, Serialize)]
struct EadOutput {
    ead: Money,
}

#[derive(Debug, Serialize)]
struct LgdOutput {
    lgd: Rate,
}

#[derive(Debug, Serialize, Deserialize)]
struct MarketLgdRequest {
    rating: String,
    #[serde(default)]
    seniority: Option<Seniority>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConcentrationRequest {
    exposures: Vec<Exposure>,
    #[serde(default)]
    top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ConcentrationOutput {
    herfindahl: Decimal,
    effective_number_of_names: Decimal,
    top_n: TopNConcentration,
    grouped: GroupedConcentration,
}

#[derive(Debug, Serialize, Deserialize)]
struct CumulativeDefaultRequest {
    rating: String,
    years: u32,
    #[serde(default = "default_state")]
    default_state: String,
}

fn default_state() -> String {
    "D".to_string()
}

#[derive(Debug, Serialize)]
struct CumulativeDefaultOutput {
    rating: String,
    years: u32,
    cumulative_default_probability: Rate,
}

fn load_reference(path: &str) -> Result<InMemoryReferenceData, Box<dyn std::error::Error>> {
    let data: InMemoryReferenceData = input::file::read_typed(path)?;
    tracing::debug!(sources = ?data.sources().collect::<Vec<_>>(), "reference data loaded");
    Ok(data)
}

pub fn run_credit_loss(args: CreditLossArgs) -> CommandResult {
    let req: CreditLossRequest = input::read_input(args.input.as_deref(), "credit loss")?;
    let started = Instant::now();
    let expected_loss = capital::expected_loss(req.pd, req.lgd, req.ead)?;
    let unexpected_loss = capital::unexpected_loss(req.pd, req.lgd, req.ead, req.lgd_volatility)?;
    let raroc = match (req.revenue, req.economic_capital) {
        (Some(revenue), Some(ec)) => Some(capital::raroc(
            revenue,
            expected_loss,
            req.operating_cost,
            ec,
        )?),
        _ => None,
    };
    envelope(
        "EL = PD x LGD x EAD; UL = EAD x sqrt(PD x var(LGD) + LGD^2 x PD(1-PD))",
        &req,
        Vec::new(),
        started,
        CreditLossOutput {
            expected_loss,
            unexpected_loss,
            raroc,
        },
    )
}

pub fn run_ead(args: EadArgs) -> CommandResult {
    let req: EadRequest = input::read_input(args.input.as_deref(), "EAD")?;
    let started = Instant::now();
    let ead = match req.outstanding {
        Some(outstanding) => exposure::ead_on_balance(outstanding),
        None => exposure::ead_off_balance(req.committed, req.drawn, req.ccf)?,
    };
    envelope("EAD = drawn + CCF x undrawn", &req, Vec::new(), started, EadOutput { ead })
}

pub fn run_workout_lgd(args: WorkoutLgdArgs) -> CommandResult {
    let wi: WorkoutLgdInput = input::read_input(args.input.as_deref(), "workout LGD")?;
    let started = Instant::now();
    let lgd = lgd::workout_lgd(&wi)?;
    envelope(
        "Workout LGD from discounted net recovery",
        &wi,
        Vec::new(),
        started,
        LgdOutput { lgd },
    )
}

pub fn run_market_lgd(args: MarketLgdArgs) -> CommandResult {
    let req: MarketLgdRequest = input::read_input(args.input.as_deref(), "market LGD")?;
    let data = load_reference(&args.reference)?;
    let started = Instant::now();
    let lgd = lgd::market_lgd(data.lgd_table(), &req.rating, req.seniority)?;
    envelope(
        "Market LGD lookup by rating and seniority",
        &req,
        Vec::new(),
        started,
        LgdOutput { lgd },
    )
}

pub fn run_concentration(args: ConcentrationArgs) -> CommandResult {
    let req: ConcentrationRequest = input::read_input(args.input.as_deref(), "concentration")?;
    let started = Instant::now();
    let result = ConcentrationOutput {
        herfindahl: concentration::herfindahl_index(&req.exposures)?,
        effective_number_of_names: concentration::effective_number_of_names(&req.exposures)?,
        top_n: concentration::top_n_concentration(&req.exposures, req.top_n)?,
        grouped: concentration::grouped_herfindahl(&req.exposures)?,
    };
    envelope(
        "Herfindahl-Hirschman index and top-N shares",
        &serde_json::json!({ "exposures": req.exposures.len(), "top_n": req.top_n }),
        Vec::new(),
        started,
        result,
    )
}

pub fn run_migration_pnl(args: MigrationArgs) -> CommandResult {
    let mi: MigrationPnlInput = input::read_input(args.input.as_deref(), "migration P&L")?;
    let data = load_reference(&args.reference)?;
    let matrix = reference::get_transition_matrix(&data, args.source.as_deref())?;
    let started = Instant::now();
    let result = migration::migration_pnl(&mi, matrix)?;
    envelope(
        "Rating-migration P&L (spread duration x spread change)",
        &mi,
        Vec::new(),
        started,
        result,
    )
}

pub fn run_cumulative_default(args: CumulativeDefaultArgs) -> CommandResult {
    let req: CumulativeDefaultRequest =
        input::read_input(args.input.as_deref(), "cumulative default probability")?;
    let data = load_reference(&args.reference)?;
    let matrix = reference::get_transition_matrix(&data, args.source.as_deref())?;
    let started = Instant::now();
    let pd = matrix.cumulative_default_probability(&req.rating, req.years, &req.default_state)?;
    envelope(
        "Cumulative PD from the n-year transition matrix",
        &req,
        Vec::new(),
        started,
        CumulativeDefaultOutput {
            rating: req.rating.clone(),
            years: req.years,
            cumulative_default_probability: pd,
        },
    )
}
