use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RiskAnalyticsError;
use crate::types::{Money, Rate};
use crate::RiskAnalyticsResult;

/// Modelled expected credit loss for one portfolio segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EclResult {
    pub segment: String,
    pub expected_loss: Money,
}

/// Management overlay on top of the modelled ECL; either sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeAdjustment {
    pub description: String,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowanceInput {
    pub ecl_results: Vec<EclResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualitative_adjustments: Option<Vec<QualitativeAdjustment>>,
    /// Exposure the allowance covers, for the coverage ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_exposure: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAllowance {
    pub segment: String,
    pub expected_loss: Money,
    /// Share of the quantitative allowance.
    pub share: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allowance {
    pub total_allowance: Money,
    pub quantitative: Money,
    pub qualitative: Money,
    pub segments: Vec<SegmentAllowance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_ratio: Option<Rate>,
}

/// Allowance = sum of segment ECL + sum of qualitative adjustments.
pub fn compute_allowance(input: &AllowanceInput) -> RiskAnalyticsResult<Allowance> {
    for (i, r) in input.ecl_results.iter().enumerate() {
        if r.expected_loss < Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                format!("ecl_results[{}].expected_loss", i),
                format!("segment '{}' has negative ECL {}", r.segment, r.expected_loss),
            ));
        }
    }

    let quantitative: Money = input.ecl_results.iter().map(|r| r.expected_loss).sum();
    let qualitative: Money = input
        .qualitative_adjustments
        .iter()
        .flatten()
        .map(|a| a.amount)
        .sum();
    let total_allowance = quantitative + qualitative;

    let segments = input
        .ecl_results
        .iter()
        .map(|r| SegmentAllowance {
            segment: r.segment.clone(),
            expected_loss: r.expected_loss,
            share: if quantitative.is_zero() {
                Decimal::ZERO
            } else {
                r.expected_loss / quantitative
            },
        })
        .collect();

    let coverage_ratio = match input.total_exposure {
        None => None,
        Some(e) if e.is_zero() => {
            return Err(RiskAnalyticsError::division("compute_allowance: total_exposure"))
        }
        Some(e) if e < Decimal::ZERO => {
            return Err(RiskAnalyticsError::validation(
                "total_exposure",
                format!("exposure {} must be positive", e),
            ))
        }
        Some(e) => Some(total_allowance / e),
    };

    Ok(Allowance {
        total_allowance,
        quantitative,
        qualitative,
        segments,
        coverage_ratio,
    })
}
