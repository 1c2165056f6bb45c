use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use risk_analytics_core::math;
use risk_analytics_core::optimization::constraints::OptimizationConstraints;
use risk_analytics_core::optimization::mean_variance::{self, MeanVarianceInput};
use risk_analytics_core::optimization::risk_parity::{self, RiskParityInput};

use super::{envelope, CommandResult};
use crate::input;

/// Arguments for mean-variance optimisation
#[derive(Args)]
pub struct MeanVarianceArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for risk-parity weights
#[derive(Args)]
pub struct RiskParityArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for sample covariance from return series
#[derive(Args)]
pub struct CovarianceArgs {
    /// Path to JSON/YAML input file with a `series` list (one per asset)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CovarianceRequest {
    series: Vec<Vec<Decimal>>,
}

#[derive(Debug, Serialize)]
struct CovarianceOutput {
    covariance_matrix: Vec<Vec<Decimal>>,
}

pub fn run_mean_variance(args: MeanVarianceArgs) -> CommandResult {
    let mut doc = input::read_input_value(args.input.as_deref(), "mean-variance optimisation")?;
    // Constraints arrive as an open JSON object; only the recognised keys survive
    let raw_constraints = doc
        .as_object_mut()
        .and_then(|m| m.remove("constraints"))
        .unwrap_or(Value::Null);
    let constraints = OptimizationConstraints::from_json(&raw_constraints)?;
    let mut mv: MeanVarianceInput = serde_json::from_value(doc)?;
    mv.constraints = constraints;
    tracing::debug!(assets = mv.expected_returns.len(), "mean-variance input parsed");

    let started = Instant::now();
    let result = mean_variance::mean_variance_optimize(&mv)?;
    tracing::debug!(iterations = result.iterations, "optimiser converged");
    envelope(
        "Mean-variance optimisation (projected gradient, Dykstra projection)",
        &mv,
        Vec::new(),
        started,
        result,
    )
}

pub fn run_risk_parity(args: RiskParityArgs) -> CommandResult {
    let rp: RiskParityInput = input::read_input(args.input.as_deref(), "risk parity")?;
    let started = Instant::now();
    let result = risk_parity::risk_parity_weights(&rp)?;
    tracing::debug!(iterations = result.iterations, "risk parity converged");
    envelope(
        "Equal risk contribution (cyclical coordinate descent)",
        &rp,
        Vec::new(),
        started,
        result,
    )
}

pub fn run_covariance(args: CovarianceArgs) -> CommandResult {
    let req: CovarianceRequest = input::read_input(args.input.as_deref(), "covariance estimation")?;
    let started = Instant::now();
    let covariance_matrix = math::covariance_from_returns(&req.series)?;
    envelope(
        "Sample covariance (n - 1)",
        &serde_json::json!({ "assets": req.series.len() }),
        Vec::new(),
        started,
        CovarianceOutput { covariance_matrix },
    )
}
