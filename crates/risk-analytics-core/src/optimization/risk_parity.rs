use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::constraints::SolverConfig;
use super::mean_variance::asset_name;
use crate::error::RiskAnalyticsError;
use crate::math::{mat_vec_multiply, portfolio_variance, sqrt_decimal, validate_covariance};
use crate::RiskAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for risk-parity portfolio construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskParityInput {
    #[serde(default)]
    pub asset_names: Vec<String>,
    /// NxN covariance matrix (row-major)
    pub covariance_matrix: Vec<Vec<Decimal>>,
    /// Target share of risk per asset; equal when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_budgets: Option<Vec<Decimal>>,
    #[serde(default = "SolverConfig::risk_parity")]
    pub solver: SolverConfig,
}

/// A single asset weight in the risk-parity portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub name: String,
    pub weight: Decimal,
}

/// Risk contribution breakdown for a single asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskContribution {
    pub name: String,
    /// Marginal risk contribution = (Sigma * w)_i / sigma_p
    pub marginal_risk: Decimal,
    /// Total risk contribution = w_i * marginal_risk
    pub risk_contribution: Decimal,
    /// Share of total portfolio risk
    pub risk_pct: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskParityOutput {
    pub weights: Vec<AssetAllocation>,
    pub risk_contributions: Vec<RiskContribution>,
    pub portfolio_volatility: Decimal,
    /// Coordinate sweeps performed.
    pub iterations: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Weights whose risk contributions `w_i (Sigma w)_i` match the risk budgets
/// (equal by default), normalised to sum to one.
///
/// Cyclical coordinate descent: each coordinate solves
/// `sigma_ii w_i^2 + a_i w_i - b_i = 0` with `a_i = sum_{j != i} sigma_ij w_j`
/// and takes the positive root, so weights stay strictly positive.
pub fn risk_parity_weights(input: &RiskParityInput) -> RiskAnalyticsResult<RiskParityOutput> {
    let cov = &input.covariance_matrix;
    let n = cov.len();
    if n == 0 {
        return Err(RiskAnalyticsError::structural(
            "covariance_matrix",
            "at least one asset is required",
        ));
    }
    if !input.asset_names.is_empty() && input.asset_names.len() != n {
        return Err(RiskAnalyticsError::structural(
            "asset_names",
            format!("{} names given for a {}x{} covariance", input.asset_names.len(), n, n),
        ));
    }
    validate_covariance(cov, n)?;
    input.solver.validate()?;
    for (i, row) in cov.iter().enumerate() {
        if row[i] <= Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                format!("covariance_matrix[{}][{}]", i, i),
                "risk parity requires strictly positive variances",
            ));
        }
    }
    let budgets = resolve_budgets(input.risk_budgets.as_deref(), n)?;

    // Start from inverse-vol weights
    let mut y: Vec<Decimal> = cov
        .iter()
        .enumerate()
        .map(|(i, row)| Decimal::ONE / sqrt_decimal(row[i]))
        .collect();
    let mut weights = normalise(&y);
    let mut last_delta = Decimal::ZERO;

    for sweep in 1..=input.solver.max_iterations {
        for i in 0..n {
            let sigma_ii = cov[i][i];
            let a: Decimal = cov[i]
                .iter()
                .zip(y.iter())
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, (s, w))| *s * *w)
                .sum();
            let disc = a * a + dec!(4) * sigma_ii * budgets[i];
            y[i] = (sqrt_decimal(disc) - a) / (dec!(2) * sigma_ii);
        }

        let next = normalise(&y);
        last_delta = next
            .iter()
            .zip(weights.iter())
            .map(|(a, b)| (*a - *b).abs())
            .fold(Decimal::ZERO, Decimal::max);
        weights = next;

        if last_delta < input.solver.tolerance {
            return Ok(build_output(&input.asset_names, cov, weights, sweep));
        }
    }

    Err(RiskAnalyticsError::ConvergenceFailure {
        function: "risk_parity_weights".into(),
        iterations: input.solver.max_iterations,
        last_delta,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_budgets(budgets: Option<&[Decimal]>, n: usize) -> RiskAnalyticsResult<Vec<Decimal>> {
    let budgets = match budgets {
        None => return Ok(vec![Decimal::ONE / Decimal::from(n as i64); n]),
        Some(b) => b,
    };
    if budgets.len() != n {
        return Err(RiskAnalyticsError::structural(
            "risk_budgets",
            format!("{} budgets given for {} assets", budgets.len(), n),
        ));
    }
    if let Some((i, b)) = budgets.iter().enumerate().find(|(_, b)| **b <= Decimal::ZERO) {
        return Err(RiskAnalyticsError::validation(
            format!("risk_budgets[{}]", i),
            format!("budget {} must be positive", b),
        ));
    }
    Ok(normalise(budgets))
}

fn normalise(values: &[Decimal]) -> Vec<Decimal> {
    let total: Decimal = values.iter().sum();
    if total.is_zero() {
        return values.to_vec();
    }
    values.iter().map(|v| *v / total).collect()
}

fn build_output(
    names: &[String],
    cov: &[Vec<Decimal>],
    weights: Vec<Decimal>,
    iterations: u32,
) -> RiskParityOutput {
    let variance = portfolio_variance(&weights, cov);
    let vol = sqrt_decimal(variance);
    let sigma_w = mat_vec_multiply(cov, &weights);

    let risk_contributions = weights
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let marginal_risk = if vol.is_zero() {
                Decimal::ZERO
            } else {
                sigma_w[i] / vol
            };
            let risk_pct = if variance.is_zero() {
                Decimal::ZERO
            } else {
                *w * sigma_w[i] / variance
            };
            RiskContribution {
                name: asset_name(names, i),
                marginal_risk,
                risk_contribution: *w * marginal_risk,
                risk_pct,
            }
        })
        .collect();

    RiskParityOutput {
        weights: weights
            .iter()
            .enumerate()
            .map(|(i, w)| AssetAllocation {
                name: asset_name(names, i),
                weight: *w,
            })
            .collect(),
        risk_contributions,
        portfolio_volatility: vol,
        iterations,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOL: Decimal = dec!(0.000000001);

    fn input(cov: Vec<Vec<Decimal>>) -> RiskParityInput {
        RiskParityInput {
            asset_names: vec![],
            covariance_matrix: cov,
            risk_budgets: None,
            solver: SolverConfig::risk_parity(),
        }
    }

    #[test]
    fn test_diagonal_inverse_vol() {
        let out = risk_parity_weights(&input(vec![
            vec![dec!(1), dec!(0)],
            vec![dec!(0), dec!(4)],
        ]))
        .unwrap();
        assert!((out.weights[0].weight - dec!(2) / dec!(3)).abs() < TOL);
        assert!((out.weights[1].weight - dec!(1) / dec!(3)).abs() < TOL);
    }

    #[test]
    fn test_correlated_contributions_equal() {
        let cov = vec![
            vec![dec!(0.04), dec!(0.006), dec!(0.002)],
            vec![dec!(0.006), dec!(0.09), dec!(0.009)],
            vec![dec!(0.002), dec!(0.009), dec!(0.0225)],
        ];
        let out = risk_parity_weights(&input(cov)).unwrap();
        let total: Decimal = out.weights.iter().map(|w| w.weight).sum();
        assert!((total - Decimal::ONE).abs() < TOL);
        for rc in &out.risk_contributions {
            assert!((rc.risk_pct - dec!(1) / dec!(3)).abs() < dec!(0.0000001));
        }
        let rc_sum: Decimal = out.risk_contributions.iter().map(|r| r.risk_contribution).sum();
        assert!((rc_sum - out.portfolio_volatility).abs() < TOL);
    }

    #[test]
    fn test_risk_budgets() {
        let mut inp = input(vec![vec![dec!(1), dec!(0)], vec![dec!(0), dec!(1)]]);
        inp.risk_budgets = Some(vec![dec!(3), dec!(1)]);
        let out = risk_parity_weights(&inp).unwrap();
        assert!((out.risk_contributions[0].risk_pct - dec!(0.75)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_zero_variance_rejected() {
        let err = risk_parity_weights(&input(vec![
            vec![dec!(0), dec!(0)],
            vec![dec!(0), dec!(4)],
        ]))
        .unwrap_err();
        assert!(matches!(err, RiskAnalyticsError::Validation { .. }));
    }

    #[test]
    fn test_convergence_failure() {
        let mut inp = input(vec![
            vec![dec!(0.04), dec!(0.018)],
            vec![dec!(0.018), dec!(0.09)],
        ]);
        inp.solver = SolverConfig {
            max_iterations: 1,
            tolerance: dec!(0.000000000001),
        };
        match risk_parity_weights(&inp).unwrap_err() {
            RiskAnalyticsError::ConvergenceFailure { function, iterations, .. } => {
                assert_eq!(function, "risk_parity_weights");
                assert_eq!(iterations, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
