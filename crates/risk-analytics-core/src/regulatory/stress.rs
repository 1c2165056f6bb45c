use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::RiskAnalyticsError;
use crate::types::{Money, Rate};
use crate::RiskAnalyticsResult;

/// Basel III CET1 minimum
const MIN_CET1_RATIO: Decimal = dec!(0.045);
/// Basel III Tier 1 minimum
const MIN_TIER1_RATIO: Decimal = dec!(0.06);
/// Basel III Total Capital minimum
const MIN_TOTAL_CAPITAL_RATIO: Decimal = dec!(0.08);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressCapitalInput {
    /// Capital per tier, e.g. {"CET1": .., "Tier1": .., "Total": ..}.
    pub base_capital: BTreeMap<String, Money>,
    /// Stress losses per tier; tiers without an entry lose nothing.
    #[serde(default)]
    pub stress_losses: BTreeMap<String, Money>,
    pub stress_rwa: Money,
    /// Pre-stress RWA, for the ratio change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_rwa: Option<Money>,
    /// Per-tier minimum ratios; the Basel III minimums for CET1, Tier 1 and
    /// Total capital when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_ratios: Option<BTreeMap<String, Rate>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierStressResult {
    pub tier: String,
    pub base_capital: Money,
    pub stress_loss: Money,
    pub post_stress_capital: Money,
    pub post_stress_ratio: Rate,
    pub pre_stress_ratio: Option<Rate>,
    pub ratio_change: Option<Rate>,
    pub minimum_ratio: Option<Rate>,
    pub passes: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressCapitalOutput {
    pub tiers: Vec<TierStressResult>,
    /// Whether every tier with a known minimum passes; `None` when no tier
    /// has one.
    pub all_pass: Option<bool>,
}

/// Post-stress ratio per tier: (base capital - stress loss) / stressed RWA.
pub fn stress_capital_ratios(
    input: &StressCapitalInput,
) -> RiskAnalyticsResult<StressCapitalOutput> {
    if input.stress_rwa <= Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "stress_rwa",
            format!("stressed RWA {} must be positive", input.stress_rwa),
        ));
    }
    if let Some(rwa) = input.base_rwa {
        if rwa <= Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                "base_rwa",
                format!("base RWA {} must be positive", rwa),
            ));
        }
    }
    if let Some(tier) = input
        .stress_losses
        .keys()
        .find(|t| !input.base_capital.contains_key(*t))
    {
        return Err(RiskAnalyticsError::validation(
            format!("stress_losses.{}", tier),
            "loss given for a tier absent from base_capital",
        ));
    }

    let tiers: Vec<TierStressResult> = input
        .base_capital
        .iter()
        .map(|(tier, base)| {
            let stress_loss = input
                .stress_losses
                .get(tier)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let post_stress_capital = *base - stress_loss;
            let post_stress_ratio = post_stress_capital / input.stress_rwa;
            let pre_stress_ratio = input.base_rwa.map(|rwa| *base / rwa);
            let minimum_ratio = match &input.minimum_ratios {
                Some(m) => m.get(tier).copied(),
                None => default_minimum(tier),
            };
            TierStressResult {
                tier: tier.clone(),
                base_capital: *base,
                stress_loss,
                post_stress_capital,
                post_stress_ratio,
                ratio_change: pre_stress_ratio.map(|pre| post_stress_ratio - pre),
                pre_stress_ratio,
                passes: minimum_ratio.map(|min| post_stress_ratio >= min),
                minimum_ratio,
            }
        })
        .collect();

    let verdicts: Vec<bool> = tiers.iter().filter_map(|t| t.passes).collect();
    let all_pass = if verdicts.is_empty() {
        None
    } else {
        Some(verdicts.iter().all(|p| *p))
    };

    Ok(StressCapitalOutput { tiers, all_pass })
}

/// Basel III minimum for a tier name such as "CET1", "tier_1" or "Total Capital".
fn default_minimum(tier: &str) -> Option<Rate> {
    let key: String = tier
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match key.as_str() {
        "cet1" | "commonequitytier1" => Some(MIN_CET1_RATIO),
        "tier1" | "t1" => Some(MIN_TIER1_RATIO),
        "total" | "totalcapital" => Some(MIN_TOTAL_CAPITAL_RATIO),
        _ => None,
    }
}
