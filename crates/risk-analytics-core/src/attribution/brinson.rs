use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::RiskAnalyticsError;
use crate::types::{Rate, ReturnMap, WeightVector};
use crate::RiskAnalyticsResult;

/// Default tolerance on |sum(weights) - 1|.
const DEFAULT_WEIGHT_TOLERANCE: Decimal = dec!(0.02);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Single-period sector data for both the portfolio and its benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrinsonInput {
    pub portfolio_weights: WeightVector,
    pub benchmark_weights: WeightVector,
    pub portfolio_returns: ReturnMap,
    pub benchmark_returns: ReturnMap,
    /// Accepted deviation of each weight total from 1 (default 0.02).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_tolerance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorAttribution {
    pub sector: String,
    pub portfolio_weight: Decimal,
    pub benchmark_weight: Decimal,
    pub portfolio_return: Rate,
    pub benchmark_return: Rate,
    pub allocation_effect: Decimal,
    pub selection_effect: Decimal,
    pub interaction_effect: Decimal,
    pub total_effect: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrinsonOutput {
    pub portfolio_return: Rate,
    pub benchmark_return: Rate,
    pub active_return: Rate,
    pub total_allocation: Decimal,
    pub total_selection: Decimal,
    pub total_interaction: Decimal,
    pub sectors: Vec<SectorAttribution>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodAttribution {
    pub period: usize,
    pub portfolio_return: Rate,
    pub benchmark_return: Rate,
    /// Carino coefficient k_t / K applied to this period's effects.
    pub linking_coefficient: Decimal,
    pub allocation: Decimal,
    pub selection: Decimal,
    pub interaction: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedAttribution {
    pub portfolio_return: Rate,
    pub benchmark_return: Rate,
    pub active_return: Rate,
    pub allocation: Decimal,
    pub selection: Decimal,
    pub interaction: Decimal,
    pub periods: Vec<PeriodAttribution>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Brinson-Hood-Beebower single-period attribution.
///
/// Sectors are the union of keys across all four maps, so a sector held only
/// by the benchmark (or only by the portfolio) is still attributed. An absent
/// entry counts as zero weight / zero return; a non-zero weight with no
/// matching return is rejected rather than silently treated as flat.
///
/// Effects sum to `portfolio_return - benchmark_return`.
pub fn brinson_attribution(input: &BrinsonInput) -> RiskAnalyticsResult<BrinsonOutput> {
    let tolerance = input.weight_tolerance.unwrap_or(DEFAULT_WEIGHT_TOLERANCE);
    if tolerance < Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "weight_tolerance",
            "must be non-negative",
        ));
    }

    let sectors: BTreeSet<&String> = input
        .portfolio_weights
        .keys()
        .chain(input.benchmark_weights.keys())
        .chain(input.portfolio_returns.keys())
        .chain(input.benchmark_returns.keys())
        .collect();
    if sectors.is_empty() {
        return Err(RiskAnalyticsError::validation(
            "sectors",
            "at least one sector is required",
        ));
    }

    let mut warnings = Vec::new();
    check_weight_total(&input.portfolio_weights, "portfolio_weights", tolerance, &mut warnings)?;
    check_weight_total(&input.benchmark_weights, "benchmark_weights", tolerance, &mut warnings)?;

    let mut rows = Vec::with_capacity(sectors.len());
    for sector in sectors {
        let wp = lookup(&input.portfolio_weights, sector);
        let wb = lookup(&input.benchmark_weights, sector);
        let rp = weighted_return(&input.portfolio_returns, sector, wp, "portfolio_returns")?;
        let rb = weighted_return(&input.benchmark_returns, sector, wb, "benchmark_returns")?;
        rows.push((sector.clone(), wp, wb, rp, rb));
    }

    Ok(attribute_rows(rows, warnings))
}

/// Link several single-period attributions with Carino log-linking so the
/// linked effects sum to the compounded active return.
pub fn link_attribution(periods: &[BrinsonInput]) -> RiskAnalyticsResult<LinkedAttribution> {
    if periods.is_empty() {
        return Err(RiskAnalyticsError::InsufficientData(
            "at least one period is required for linking".into(),
        ));
    }

    let singles = periods
        .iter()
        .map(brinson_attribution)
        .collect::<RiskAnalyticsResult<Vec<_>>>()?;

    let mut total_p = Decimal::ONE;
    let mut total_b = Decimal::ONE;
    for s in &singles {
        total_p *= Decimal::ONE + s.portfolio_return;
        total_b *= Decimal::ONE + s.benchmark_return;
    }
    let total_p = total_p - Decimal::ONE;
    let total_b = total_b - Decimal::ONE;
    let big_k = carino_coefficient(total_p, total_b, "total")?;

    let mut allocation = Decimal::ZERO;
    let mut selection = Decimal::ZERO;
    let mut interaction = Decimal::ZERO;
    let mut linked = Vec::with_capacity(singles.len());

    for (t, s) in singles.iter().enumerate() {
        let label = format!("period {}", t);
        let k_t = carino_coefficient(s.portfolio_return, s.benchmark_return, &label)?;
        let coef = k_t / big_k;
        let a = coef * s.total_allocation;
        let sel = coef * s.total_selection;
        let i = coef * s.total_interaction;
        allocation += a;
        selection += sel;
        interaction += i;
        linked.push(PeriodAttribution {
            period: t,
            portfolio_return: s.portfolio_return,
            benchmark_return: s.benchmark_return,
            linking_coefficient: coef,
            allocation: a,
            selection: sel,
            interaction: i,
        });
    }

    Ok(LinkedAttribution {
        portfolio_return: total_p,
        benchmark_return: total_b,
        active_return: total_p - total_b,
        allocation,
        selection,
        interaction,
        periods: linked,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn attribute_rows(
    rows: Vec<(String, Decimal, Decimal, Rate, Rate)>,
    warnings: Vec<String>,
) -> BrinsonOutput {
    let portfolio_return: Decimal = rows.iter().map(|(_, wp, _, rp, _)| *wp * *rp).sum();
    let benchmark_return: Decimal = rows.iter().map(|(_, _, wb, _, rb)| *wb * *rb).sum();

    let mut total_allocation = Decimal::ZERO;
    let mut total_selection = Decimal::ZERO;
    let mut total_interaction = Decimal::ZERO;
    let mut sectors = Vec::with_capacity(rows.len());

    for (sector, wp, wb, rp, rb) in rows {
        let allocation_effect = (wp - wb) * rb;
        let selection_effect = wb * (rp - rb);
        let interaction_effect = (wp - wb) * (rp - rb);
        total_allocation += allocation_effect;
        total_selection += selection_effect;
        total_interaction += interaction_effect;
        sectors.push(SectorAttribution {
            sector,
            portfolio_weight: wp,
            benchmark_weight: wb,
            portfolio_return: rp,
            benchmark_return: rb,
            allocation_effect,
            selection_effect,
            interaction_effect,
            total_effect: allocation_effect + selection_effect + interaction_effect,
        });
    }

    BrinsonOutput {
        portfolio_return,
        benchmark_return,
        active_return: portfolio_return - benchmark_return,
        total_allocation,
        total_selection,
        total_interaction,
        sectors,
        warnings,
    }
}

fn lookup(map: &WeightVector, key: &str) -> Decimal {
    map.get(key).copied().unwrap_or(Decimal::ZERO)
}

fn weighted_return(
    returns: &ReturnMap,
    sector: &str,
    weight: Decimal,
    field: &str,
) -> RiskAnalyticsResult<Rate> {
    match returns.get(sector) {
        Some(r) => Ok(*r),
        None if weight.is_zero() => Ok(Decimal::ZERO),
        None => Err(RiskAnalyticsError::validation(
            format!("{}.{}", field, sector),
            format!("sector has weight {} but no return", weight),
        )),
    }
}

fn check_weight_total(
    weights: &WeightVector,
    field: &str,
    tolerance: Decimal,
    warnings: &mut Vec<String>,
) -> RiskAnalyticsResult<()> {
    let sum: Decimal = weights.values().sum();
    if (sum - Decimal::ONE).abs() > tolerance {
        return Err(RiskAnalyticsError::validation(
            field,
            format!("weights sum to {} (must be within {} of 1.0)", sum, tolerance),
        ));
    }
    for (sector, w) in weights {
        if *w < Decimal::ZERO {
            warnings.push(format!(
                "Negative weight in {} for '{}': {} (short position)",
                field, sector, w
            ));
        }
    }
    Ok(())
}

/// Carino coefficient [ln(1+R) - ln(1+B)] / (R - B), or 1/(1+R) when R == B.
fn carino_coefficient(r: Rate, b: Rate, label: &str) -> RiskAnalyticsResult<Decimal> {
    let one_r = Decimal::ONE + r;
    let one_b = Decimal::ONE + b;
    if one_r <= Decimal::ZERO || one_b <= Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "periods",
            format!("{}: returns at or below -100% cannot be log-linked", label),
        ));
    }
    if r == b {
        return Ok(Decimal::ONE / one_r);
    }
    let ln_r = one_r.checked_ln().ok_or_else(|| {
        RiskAnalyticsError::validation("periods", format!("{}: ln(1+R) undefined", label))
    })?;
    let ln_b = one_b.checked_ln().ok_or_else(|| {
        RiskAnalyticsError::validation("periods", format!("{}: ln(1+B) undefined", label))
    })?;
    Ok((ln_r - ln_b) / (r - b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
