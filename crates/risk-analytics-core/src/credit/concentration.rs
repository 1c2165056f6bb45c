use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RiskAnalyticsError;
use crate::types::{Exposure, Money, Rate};
use crate::RiskAnalyticsResult;

/// Label used for exposures that carry no group.
pub const UNASSIGNED_GROUP: &str = "UNASSIGNED";

/// Default number of names reported by [`top_n_concentration`].
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationEntry {
    pub id: String,
    pub amount: Money,
    /// Share of total exposure.
    pub share: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNConcentration {
    pub entries: Vec<ConcentrationEntry>,
    /// Combined share of the reported names.
    pub cumulative_share: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConcentration {
    pub group: String,
    pub amount: Money,
    pub share: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedConcentration {
    /// Groups in order of first appearance.
    pub groups: Vec<GroupConcentration>,
    pub herfindahl: Decimal,
}

fn total_exposure(exposures: &[Exposure]) -> RiskAnalyticsResult<Money> {
    let mut total = Decimal::ZERO;
    for (i, e) in exposures.iter().enumerate() {
        if e.amount < Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                format!("exposures[{}].amount", i),
                format!("exposure '{}' has negative amount {}", e.id, e.amount),
            ));
        }
        total += e.amount;
    }
    Ok(total)
}

fn hhi_of(amounts: impl Iterator<Item = Money>, total: Money) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    amounts
        .map(|a| {
            let s = a / total;
            s * s
        })
        .sum()
}

/// HHI = sum (e_i / sum e)^2; zero for a portfolio with no exposure.
pub fn herfindahl_index(exposures: &[Exposure]) -> RiskAnalyticsResult<Decimal> {
    let total = total_exposure(exposures)?;
    Ok(hhi_of(exposures.iter().map(|e| e.amount), total))
}

/// 1 / HHI, the number of equal names with the same concentration.
pub fn effective_number_of_names(exposures: &[Exposure]) -> RiskAnalyticsResult<Decimal> {
    let hhi = herfindahl_index(exposures)?;
    if hhi.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok(Decimal::ONE / hhi)
}

/// The `n` largest exposures with their shares. Equal amounts keep input
/// order.
pub fn top_n_concentration(
    exposures: &[Exposure],
    n: Option<usize>,
) -> RiskAnalyticsResult<TopNConcentration> {
    let n = n.unwrap_or(DEFAULT_TOP_N);
    let total = total_exposure(exposures)?;

    let mut ranked: Vec<&Exposure> = exposures.iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount));

    let share = |amount: Money| {
        if total.is_zero() {
            Decimal::ZERO
        } else {
            amount / total
        }
    };

    let entries: Vec<ConcentrationEntry> = ranked
        .into_iter()
        .take(n)
        .map(|e| ConcentrationEntry {
            id: e.id.clone(),
            amount: e.amount,
            share: share(e.amount),
        })
        .collect();
    let cumulative_share = entries.iter().map(|e| e.share).sum();

    Ok(TopNConcentration {
        entries,
        cumulative_share,
    })
}

/// Concentration after aggregating exposures by their group label.
pub fn grouped_herfindahl(exposures: &[Exposure]) -> RiskAnalyticsResult<GroupedConcentration> {
    let total = total_exposure(exposures)?;

    let mut sums: Vec<(String, Money)> = Vec::new();
    for e in exposures {
        let label = e.group.as_deref().unwrap_or(UNASSIGNED_GROUP);
        match sums.iter_mut().find(|(g, _)| g == label) {
            Some((_, amount)) => *amount += e.amount,
            None => sums.push((label.to_string(), e.amount)),
        }
    }

    let herfindahl = hhi_of(sums.iter().map(|(_, a)| *a), total);
    let groups = sums
        .into_iter()
        .map(|(group, amount)| GroupConcentration {
            share: if total.is_zero() {
                Decimal::ZERO
            } else {
                amount / total
            },
            group,
            amount,
        })
        .collect();

    Ok(GroupedConcentration { groups, herfindahl })
}
