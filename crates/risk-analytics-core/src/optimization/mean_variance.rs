use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::constraints::{OptimizationConstraints, SolverConfig};
use crate::error::RiskAnalyticsError;
use crate::math::{
    mat_vec_multiply, max_abs_entry, max_abs_row_sum, mean, null_space_basis,
    portfolio_variance, sqrt_decimal, validate_covariance, vec_dot,
};
use crate::RiskAnalyticsResult;

/// Largest equality or bound violation accepted in a returned portfolio.
const FEASIBILITY_TOLERANCE: Decimal = dec!(0.00000001);
/// Below this spread the target-return row is collinear with the budget row.
const DEGENERACY_TOLERANCE: Decimal = dec!(0.0000000001);
/// Alternating-projection sweeps per gradient step.
const PROJECTION_ITERATIONS: u32 = 1_000;
/// Any weight beyond this magnitude means the objective has no minimum.
const DIVERGENCE_BOUND: Decimal = dec!(1000000000000);
/// Pivot threshold, relative to the largest covariance entry, for the
/// zero-variance directions of the covariance matrix.
const NULL_SPACE_TOLERANCE: Decimal = dec!(0.000000000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input to mean-variance optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanVarianceInput {
    /// Asset identifiers; generated as `asset_1..asset_n` when empty.
    #[serde(default)]
    pub asset_names: Vec<String>,
    /// Expected return per asset.
    pub expected_returns: Vec<Decimal>,
    /// N x N covariance matrix.
    pub covariance_matrix: Vec<Vec<Decimal>>,
    #[serde(default)]
    pub constraints: OptimizationConstraints,
    /// Lambda in `lambda * w'Sw - mu'w` (default 1). Ignored with a target return.
    #[serde(default)]
    pub risk_aversion: Option<Decimal>,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// A single asset weight with its return and risk contributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetWeight {
    pub name: String,
    pub weight: Decimal,
    /// Weight times expected return.
    pub contribution_to_return: Decimal,
    /// Share of portfolio variance, w_i (Sw)_i / w'Sw.
    pub contribution_to_risk: Decimal,
}

/// Output of mean-variance optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanVarianceOutput {
    pub weights: Vec<AssetWeight>,
    pub expected_return: Decimal,
    pub variance: Decimal,
    pub volatility: Decimal,
    /// Objective at the solution (variance when a target return is set).
    pub objective_value: Decimal,
    pub iterations: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Optimize portfolio weights under the closed constraint set.
///
/// Without a target return the objective is `lambda * w'Sw - mu'w`; with one
/// it is `w'Sw` subject to `w'mu = target`. Solved by projected gradient
/// descent with step `1/L`, where each projection alternates between the
/// equality constraints and the weight bounds (Dykstra).
pub fn mean_variance_optimize(
    input: &MeanVarianceInput,
) -> RiskAnalyticsResult<MeanVarianceOutput> {
    let n = input.expected_returns.len();
    validate_input(input, n)?;

    let mu = &input.expected_returns;
    let sigma = &input.covariance_matrix;
    let constraints = &input.constraints;
    let solver = &input.solver;
    let lambda = input.risk_aversion.unwrap_or(Decimal::ONE);
    let targeted = constraints.target_return.is_some();

    let bounds = Bounds {
        lower: constraints.lower_bound(),
        upper: constraints.max_weight,
    };
    check_feasibility(mu, constraints, &bounds)?;
    check_bounded_objective(mu, sigma, constraints, &bounds)?;
    let affine = AffineSet::build(mu, constraints);

    let scale = if targeted { Decimal::ONE } else { lambda };
    let lipschitz = dec!(2) * scale * max_abs_row_sum(sigma);
    let step = if lipschitz.is_zero() {
        Decimal::ONE
    } else {
        Decimal::ONE / lipschitz
    };

    let gradient = |w: &[Decimal]| -> Vec<Decimal> {
        let sw = mat_vec_multiply(sigma, w);
        if targeted {
            sw.iter().map(|v| dec!(2) * *v).collect()
        } else {
            sw.iter()
                .zip(mu.iter())
                .map(|(v, m)| dec!(2) * lambda * *v - *m)
                .collect()
        }
    };

    let start = vec![Decimal::ONE / Decimal::from(n as i64); n];
    let mut w = project(&start, &affine, &bounds, solver);
    let mut last_delta = Decimal::ZERO;
    let mut iterations = 0u32;
    let mut converged = false;

    for k in 1..=solver.max_iterations {
        let g = gradient(&w);
        let y: Vec<Decimal> = w
            .iter()
            .zip(g.iter())
            .map(|(wi, gi)| *wi - step * *gi)
            .collect();
        let next = project(&y, &affine, &bounds, solver);
        last_delta = max_abs_diff(&next, &w);
        w = next;
        iterations = k;

        if w.iter().any(|wi| wi.abs() > DIVERGENCE_BOUND) {
            return Err(RiskAnalyticsError::Infeasible(
                "objective is unbounded over the constraint set".into(),
            ));
        }
        if last_delta < solver.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(RiskAnalyticsError::ConvergenceFailure {
            function: "mean_variance_optimize".into(),
            iterations,
            last_delta,
        });
    }

    if affine.max_residual(&w) > FEASIBILITY_TOLERANCE
        || bounds.max_violation(&w) > FEASIBILITY_TOLERANCE
    {
        return Err(RiskAnalyticsError::Infeasible(
            "constraints admit no portfolio".into(),
        ));
    }

    let variance = portfolio_variance(&w, sigma);
    let expected_return = vec_dot(&w, mu);
    let objective_value = if targeted {
        variance
    } else {
        lambda * variance - expected_return
    };
    let sw = mat_vec_multiply(sigma, &w);

    let weights = w
        .iter()
        .enumerate()
        .map(|(i, wi)| AssetWeight {
            name: asset_name(&input.asset_names, i),
            weight: *wi,
            contribution_to_return: *wi * mu[i],
            contribution_to_risk: if variance.is_zero() {
                Decimal::ZERO
            } else {
                *wi * sw[i] / variance
            },
        })
        .collect();

    Ok(MeanVarianceOutput {
        weights,
        expected_return,
        variance,
        volatility: sqrt_decimal(variance),
        objective_value,
        iterations,
    })
}

// ---------------------------------------------------------------------------
// Constraint sets
// ---------------------------------------------------------------------------

/// Box constraint on each weight; `None` is unbounded on that side.
struct Bounds {
    lower: Option<Decimal>,
    upper: Option<Decimal>,
}

impl Bounds {
    fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    fn clamp(&self, w: &[Decimal]) -> Vec<Decimal> {
        w.iter()
            .map(|wi| {
                let mut v = *wi;
                if let Some(lo) = self.lower {
                    v = v.max(lo);
                }
                if let Some(hi) = self.upper {
                    v = v.min(hi);
                }
                v
            })
            .collect()
    }

    fn max_violation(&self, w: &[Decimal]) -> Decimal {
        w.iter()
            .map(|wi| {
                let below = self.lower.map_or(Decimal::ZERO, |lo| (lo - *wi).max(Decimal::ZERO));
                let above = self.upper.map_or(Decimal::ZERO, |hi| (*wi - hi).max(Decimal::ZERO));
                below.max(above)
            })
            .fold(Decimal::ZERO, Decimal::max)
    }
}

/// Linearly independent equality rows `A w = b` (at most two).
struct AffineSet {
    rows: Vec<Vec<Decimal>>,
    rhs: Vec<Decimal>,
    /// (A A')^-1
    gram_inv: Vec<Vec<Decimal>>,
}

impl AffineSet {
    fn build(mu: &[Decimal], constraints: &OptimizationConstraints) -> Self {
        let n = mu.len();
        let mut rows = Vec::new();
        let mut rhs = Vec::new();
        if constraints.sum_to_one {
            rows.push(vec![Decimal::ONE; n]);
            rhs.push(Decimal::ONE);
        }
        if let Some(target) = constraints.target_return {
            if !target_row_is_degenerate(mu, constraints.sum_to_one) {
                rows.push(mu.to_vec());
                rhs.push(target);
            }
        }

        let gram_inv = match rows.len() {
            0 => Vec::new(),
            1 => vec![vec![Decimal::ONE / vec_dot(&rows[0], &rows[0])]],
            _ => {
                let g11 = vec_dot(&rows[0], &rows[0]);
                let g12 = vec_dot(&rows[0], &rows[1]);
                let g22 = vec_dot(&rows[1], &rows[1]);
                let det = g11 * g22 - g12 * g12;
                vec![
                    vec![g22 / det, -g12 / det],
                    vec![-g12 / det, g11 / det],
                ]
            }
        };

        AffineSet {
            rows,
            rhs,
            gram_inv,
        }
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn residuals(&self, w: &[Decimal]) -> Vec<Decimal> {
        self.rows
            .iter()
            .zip(self.rhs.iter())
            .map(|(row, b)| vec_dot(row, w) - *b)
            .collect()
    }

    fn max_residual(&self, w: &[Decimal]) -> Decimal {
        self.residuals(w)
            .iter()
            .map(|r| r.abs())
            .fold(Decimal::ZERO, Decimal::max)
    }

    /// w - A'(AA')^-1 (Aw - b)
    fn project(&self, w: &[Decimal]) -> Vec<Decimal> {
        let r = self.residuals(w);
        let multipliers = mat_vec_multiply(&self.gram_inv, &r);
        let mut out = w.to_vec();
        for (row, m) in self.rows.iter().zip(multipliers.iter()) {
            for (o, a) in out.iter_mut().zip(row.iter()) {
                *o -= *m * *a;
            }
        }
        out
    }
}

/// Euclidean projection onto the intersection of the equality rows and the
/// weight bounds.
fn project(
    y: &[Decimal],
    affine: &AffineSet,
    bounds: &Bounds,
    solver: &SolverConfig,
) -> Vec<Decimal> {
    if affine.is_empty() {
        return bounds.clamp(y);
    }
    if bounds.is_unbounded() {
        return affine.project(y);
    }

    let n = y.len();
    let tolerance = solver.tolerance / dec!(100);
    let mut x = y.to_vec();
    let mut p = vec![Decimal::ZERO; n];
    let mut q = vec![Decimal::ZERO; n];

    for _ in 0..PROJECTION_ITERATIONS {
        let a_in: Vec<Decimal> = x.iter().zip(p.iter()).map(|(a, b)| *a + *b).collect();
        let a = affine.project(&a_in);
        p = a_in.iter().zip(a.iter()).map(|(u, v)| *u - *v).collect();

        let b_in: Vec<Decimal> = a.iter().zip(q.iter()).map(|(u, v)| *u + *v).collect();
        let b = bounds.clamp(&b_in);
        q = b_in.iter().zip(b.iter()).map(|(u, v)| *u - *v).collect();

        let delta = max_abs_diff(&b, &x);
        x = b;
        if delta < tolerance && affine.max_residual(&x) < tolerance {
            break;
        }
    }
    x
}

// ---------------------------------------------------------------------------
// Feasibility
// ---------------------------------------------------------------------------

fn target_row_is_degenerate(mu: &[Decimal], sum_to_one: bool) -> bool {
    if sum_to_one {
        let m = mean(mu);
        mu.iter().all(|r| (*r - m).abs() <= DEGENERACY_TOLERANCE)
    } else {
        mu.iter().all(|r| r.abs() <= DEGENERACY_TOLERANCE)
    }
}

fn check_feasibility(
    mu: &[Decimal],
    constraints: &OptimizationConstraints,
    bounds: &Bounds,
) -> RiskAnalyticsResult<()> {
    let n = Decimal::from(mu.len() as i64);

    if constraints.sum_to_one {
        if let Some(cap) = bounds.upper {
            if n * cap < Decimal::ONE {
                return Err(RiskAnalyticsError::Infeasible(format!(
                    "{} assets capped at {} cannot sum to one",
                    n, cap
                )));
            }
        }
    }

    let target = match constraints.target_return {
        Some(t) => t,
        None => return Ok(()),
    };

    if target_row_is_degenerate(mu, constraints.sum_to_one) {
        let implied = if constraints.sum_to_one {
            mean(mu)
        } else {
            Decimal::ZERO
        };
        if (target - implied).abs() > FEASIBILITY_TOLERANCE {
            return Err(RiskAnalyticsError::Infeasible(format!(
                "every feasible portfolio returns {}, target is {}",
                implied, target
            )));
        }
        return Ok(());
    }

    let (lo, hi) = attainable_return_range(mu, bounds, constraints.sum_to_one);
    let below = lo.is_some_and(|lo| target < lo - FEASIBILITY_TOLERANCE);
    let above = hi.is_some_and(|hi| target > hi + FEASIBILITY_TOLERANCE);
    if below || above {
        let show = |v: Option<Decimal>, inf: &str| v.map_or(inf.to_string(), |d| d.to_string());
        return Err(RiskAnalyticsError::Infeasible(format!(
            "target return {} outside attainable range [{}, {}]",
            target,
            show(lo, "-inf"),
            show(hi, "inf")
        )));
    }
    Ok(())
}

/// With no budget row, no target and no cap, `lambda * w'Sw - mu'w` has no
/// minimum when an admissible direction `d` has `Sd = 0` and `mu'd > 0`.
/// Directions are taken from the null-space basis of the covariance; under
/// long-only a basis vector is admissible when it is sign-definite.
fn check_bounded_objective(
    mu: &[Decimal],
    sigma: &[Vec<Decimal>],
    constraints: &OptimizationConstraints,
    bounds: &Bounds,
) -> RiskAnalyticsResult<()> {
    if constraints.sum_to_one || constraints.target_return.is_some() || bounds.upper.is_some() {
        return Ok(());
    }
    let long_only = bounds.lower.is_some();
    let tolerance = max_abs_entry(sigma) * NULL_SPACE_TOLERANCE;

    for direction in null_space_basis(sigma, tolerance) {
        let gain = vec_dot(mu, &direction);
        let unbounded = if long_only {
            let non_negative = direction.iter().all(|v| *v >= Decimal::ZERO);
            let non_positive = direction.iter().all(|v| *v <= Decimal::ZERO);
            (non_negative && gain > DEGENERACY_TOLERANCE)
                || (non_positive && gain < -DEGENERACY_TOLERANCE)
        } else {
            gain.abs() > DEGENERACY_TOLERANCE
        };
        if unbounded {
            return Err(RiskAnalyticsError::Infeasible(format!(
                "objective is unbounded: a zero-variance direction earns {} per unit",
                gain.abs()
            )));
        }
    }
    Ok(())
}

/// Range of `w'mu` over the constraint set; `None` is unbounded.
fn attainable_return_range(
    mu: &[Decimal],
    bounds: &Bounds,
    sum_to_one: bool,
) -> (Option<Decimal>, Option<Decimal>) {
    let long_only = bounds.lower.is_some();
    let any_pos = mu.iter().any(|r| *r > Decimal::ZERO);
    let any_neg = mu.iter().any(|r| *r < Decimal::ZERO);

    if sum_to_one {
        if long_only {
            let cap = bounds.upper.map_or(Decimal::ONE, |c| c.min(Decimal::ONE));
            let mut asc = mu.to_vec();
            asc.sort();
            let mut desc = asc.clone();
            desc.reverse();
            return (Some(greedy_fill(&asc, cap)), Some(greedy_fill(&desc, cap)));
        }
        return match bounds.upper {
            None => (None, None),
            Some(c) => {
                // All but one asset at the cap, the remaining one absorbs the residual.
                let total: Decimal = mu.iter().sum();
                let others = Decimal::from((mu.len() - 1) as i64) * c;
                let mu_min = mu.iter().copied().fold(mu[0], Decimal::min);
                let mu_max = mu.iter().copied().fold(mu[0], Decimal::max);
                let hi = c * (total - mu_min) + (Decimal::ONE - others) * mu_min;
                let lo = c * (total - mu_max) + (Decimal::ONE - others) * mu_max;
                (Some(lo), Some(hi))
            }
        };
    }

    let pos_sum: Decimal = mu.iter().filter(|r| **r > Decimal::ZERO).sum();
    let neg_sum: Decimal = mu.iter().filter(|r| **r < Decimal::ZERO).sum();

    if long_only {
        let hi = match bounds.upper {
            Some(c) => Some(c * pos_sum),
            None if any_pos => None,
            None => Some(Decimal::ZERO),
        };
        let lo = match bounds.upper {
            Some(c) => Some(c * neg_sum),
            None if any_neg => None,
            None => Some(Decimal::ZERO),
        };
        return (lo, hi);
    }

    let hi = if any_neg {
        None
    } else {
        match bounds.upper {
            Some(c) => Some(c * pos_sum),
            None if any_pos => None,
            None => Some(Decimal::ZERO),
        }
    };
    let lo = if any_pos {
        None
    } else {
        match bounds.upper {
            Some(c) => Some(c * neg_sum),
            None if any_neg => None,
            None => Some(Decimal::ZERO),
        }
    };
    (lo, hi)
}

/// Fill weights up to `cap` in the given order until fully invested.
fn greedy_fill(ordered: &[Decimal], cap: Decimal) -> Decimal {
    let mut remaining = Decimal::ONE;
    let mut total = Decimal::ZERO;
    for r in ordered {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = cap.min(remaining);
        total += take * *r;
        remaining -= take;
    }
    total
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &MeanVarianceInput, n: usize) -> RiskAnalyticsResult<()> {
    if n == 0 {
        return Err(RiskAnalyticsError::structural(
            "expected_returns",
            "at least one asset is required",
        ));
    }
    if !input.asset_names.is_empty() && input.asset_names.len() != n {
        return Err(RiskAnalyticsError::structural(
            "asset_names",
            format!(
                "{} names given for {} expected returns",
                input.asset_names.len(),
                n
            ),
        ));
    }
    validate_covariance(&input.covariance_matrix, n)?;
    input.constraints.validate()?;
    input.solver.validate()?;
    if let Some(lambda) = input.risk_aversion {
        if lambda <= Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                "risk_aversion",
                format!("{} must be positive", lambda),
            ));
        }
    }
    Ok(())
}

pub(crate) fn asset_name(names: &[String], i: usize) -> String {
    names
        .get(i)
        .cloned()
        .unwrap_or_else(|| format!("asset_{}", i + 1))
}

fn max_abs_diff(a: &[Decimal], b: &[Decimal]) -> Decimal {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x - *y).abs())
        .fold(Decimal::ZERO, Decimal::max)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOL: Decimal = dec!(0.00000001);

    fn diag(values: &[Decimal]) -> Vec<Vec<Decimal>> {
        let n = values.len();
        (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { values[i] } else { Decimal::ZERO })
                    .collect()
            })
            .collect()
    }

    fn input(
        mu: Vec<Decimal>,
        cov: Vec<Vec<Decimal>>,
        constraints: OptimizationConstraints,
    ) -> MeanVarianceInput {
        MeanVarianceInput {
            asset_names: vec![],
            expected_returns: mu,
            covariance_matrix: cov,
            constraints,
            risk_aversion: None,
            solver: SolverConfig::default(),
        }
    }

    fn long_only() -> OptimizationConstraints {
        OptimizationConstraints {
            long_only: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_symmetric_assets_split_evenly() {
        let inp = input(
            vec![dec!(0.08), dec!(0.08)],
            diag(&[dec!(0.04), dec!(0.04)]),
            long_only(),
        );
        let out = mean_variance_optimize(&inp).unwrap();
        assert_eq!(out.weights[0].weight, dec!(0.5));
        assert_eq!(out.weights[1].weight, dec!(0.5));
        assert_eq!(out.weights[0].name, "asset_1");
        assert_eq!(out.expected_return, dec!(0.08));
    }

    #[test]
    fn test_target_return_pins_two_asset_portfolio() {
        let constraints = OptimizationConstraints {
            target_return: Some(dec!(0.08)),
            ..Default::default()
        };
        let inp = input(
            vec![dec!(0.05), dec!(0.10)],
            diag(&[dec!(0.04), dec!(0.09)]),
            constraints,
        );
        let out = mean_variance_optimize(&inp).unwrap();
        assert!((out.weights[0].weight - dec!(0.4)).abs() < TOL);
        assert!((out.weights[1].weight - dec!(0.6)).abs() < TOL);
        assert!((out.expected_return - dec!(0.08)).abs() < TOL);
        assert_eq!(out.objective_value, out.variance);
    }

    #[test]
    fn test_unconstrained_closed_form() {
        // w* = mu / (2 lambda sigma^2) for a diagonal covariance
        let constraints = OptimizationConstraints {
            sum_to_one: false,
            ..Default::default()
        };
        let inp = input(
            vec![dec!(0.08), dec!(0.09)],
            diag(&[dec!(0.04), dec!(0.09)]),
            constraints,
        );
        let out = mean_variance_optimize(&inp).unwrap();
        assert!((out.weights[0].weight - dec!(1)).abs() < TOL);
        assert!((out.weights[1].weight - dec!(0.5)).abs() < TOL);
    }

    #[test]
    fn test_long_only_clips_negative_asset() {
        let inp = input(
            vec![dec!(0.10), dec!(-0.05)],
            diag(&[dec!(0.04), dec!(0.04)]),
            long_only(),
        );
        let out = mean_variance_optimize(&inp).unwrap();
        assert!((out.weights[0].weight - dec!(1)).abs() < TOL);
        assert!(out.weights[1].weight.abs() < TOL);
    }

    #[test]
    fn test_max_weight_cap_binds() {
        let constraints = OptimizationConstraints {
            long_only: true,
            max_weight: Some(dec!(0.4)),
            ..Default::default()
        };
        let inp = input(
            vec![dec!(0.20), dec!(0.05), dec!(0.05)],
            diag(&[dec!(0.04), dec!(0.04), dec!(0.04)]),
            constraints,
        );
        let out = mean_variance_optimize(&inp).unwrap();
        let total: Decimal = out.weights.iter().map(|w| w.weight).sum();
        assert!((total - Decimal::ONE).abs() < TOL);
        assert!((out.weights[0].weight - dec!(0.4)).abs() < TOL);
        assert!((out.weights[1].weight - dec!(0.3)).abs() < TOL);
        for w in &out.weights {
            assert!(w.weight <= dec!(0.4) + TOL);
        }
    }

    #[test]
    fn test_cap_too_tight_is_infeasible() {
        let constraints = OptimizationConstraints {
            long_only: true,
            max_weight: Some(dec!(0.3)),
            ..Default::default()
        };
        let inp = input(
            vec![dec!(0.1), dec!(0.1), dec!(0.1)],
            diag(&[dec!(0.04), dec!(0.04), dec!(0.04)]),
            constraints,
        );
        assert!(matches!(
            mean_variance_optimize(&inp),
            Err(RiskAnalyticsError::Infeasible(_))
        ));
    }

    #[test]
    fn test_unreachable_target_is_infeasible() {
        let constraints = OptimizationConstraints {
            long_only: true,
            target_return: Some(dec!(0.20)),
            ..Default::default()
        };
        let inp = input(
            vec![dec!(0.05), dec!(0.10)],
            diag(&[dec!(0.04), dec!(0.09)]),
            constraints,
        );
        assert!(matches!(
            mean_variance_optimize(&inp),
            Err(RiskAnalyticsError::Infeasible(_))
        ));
    }

    #[test]
    fn test_asymmetric_covariance_is_structural() {
        let inp = input(
            vec![dec!(0.05), dec!(0.10)],
            vec![vec![dec!(0.04), dec!(0.01)], vec![dec!(0.02), dec!(0.09)]],
            OptimizationConstraints::default(),
        );
        assert!(matches!(
            mean_variance_optimize(&inp),
            Err(RiskAnalyticsError::Structural { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_structural() {
        let inp = input(
            vec![dec!(0.05), dec!(0.10), dec!(0.07)],
            diag(&[dec!(0.04), dec!(0.09)]),
            OptimizationConstraints::default(),
        );
        assert!(matches!(
            mean_variance_optimize(&inp),
            Err(RiskAnalyticsError::Structural { .. })
        ));
    }

    #[test]
    fn test_iteration_cap_reports_convergence_failure() {
        let mut inp = input(
            vec![dec!(0.08), dec!(0.09)],
            diag(&[dec!(0.04), dec!(0.09)]),
            OptimizationConstraints {
                sum_to_one: false,
                ..Default::default()
            },
        );
        inp.solver = SolverConfig {
            max_iterations: 1,
            tolerance: dec!(0.0000000001),
        };
        match mean_variance_optimize(&inp).unwrap_err() {
            RiskAnalyticsError::ConvergenceFailure { iterations, .. } => assert_eq!(iterations, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_covariance_without_budget_is_unbounded() {
        let inp = input(
            vec![dec!(0.05), dec!(0.05)],
            diag(&[Decimal::ZERO, Decimal::ZERO]),
            OptimizationConstraints {
                sum_to_one: false,
                ..Default::default()
            },
        );
        assert!(matches!(
            mean_variance_optimize(&inp),
            Err(RiskAnalyticsError::Infeasible(_))
        ));
    }

    #[test]
    fn test_hedged_pair_with_return_gap_is_unbounded() {
        // long one, short the other: zero variance, positive return
        let cov = vec![vec![dec!(0.04), dec!(0.04)], vec![dec!(0.04), dec!(0.04)]];
        let inp = input(
            vec![dec!(0.08), dec!(0.05)],
            cov,
            OptimizationConstraints {
                sum_to_one: false,
                ..Default::default()
            },
        );
        assert!(matches!(
            mean_variance_optimize(&inp),
            Err(RiskAnalyticsError::Infeasible(_))
        ));
    }

    #[test]
    fn test_long_only_offsetting_pair_is_unbounded() {
        let cov = vec![vec![dec!(0.04), dec!(-0.04)], vec![dec!(-0.04), dec!(0.04)]];
        let inp = input(
            vec![dec!(0.05), dec!(0.05)],
            cov,
            OptimizationConstraints {
                long_only: true,
                sum_to_one: false,
                ..Default::default()
            },
        );
        assert!(matches!(
            mean_variance_optimize(&inp),
            Err(RiskAnalyticsError::Infeasible(_))
        ));
    }

    #[test]
    fn test_singular_covariance_with_return_in_range_solves() {
        // S [1, -1]' = 0 but mu'[1, -1] = 0, so the optimum exists: sum = 1
        let cov = vec![vec![dec!(0.04), dec!(0.04)], vec![dec!(0.04), dec!(0.04)]];
        let inp = input(
            vec![dec!(0.08), dec!(0.08)],
            cov,
            OptimizationConstraints {
                sum_to_one: false,
                ..Default::default()
            },
        );
        let out = mean_variance_optimize(&inp).unwrap();
        let total: Decimal = out.weights.iter().map(|w| w.weight).sum();
        assert!((total - Decimal::ONE).abs() < TOL);
    }

    #[test]
    fn test_non_positive_risk_aversion_rejected() {
        let mut inp = input(
            vec![dec!(0.08), dec!(0.08)],
            diag(&[dec!(0.04), dec!(0.04)]),
            OptimizationConstraints::default(),
        );
        inp.risk_aversion = Some(Decimal::ZERO);
        assert!(matches!(
            mean_variance_optimize(&inp),
            Err(RiskAnalyticsError::Validation { .. })
        ));
    }
}
