use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::RiskAnalyticsError;
use crate::types::{Money, Rate};
use crate::RiskAnalyticsResult;

// ---------------------------------------------------------------------------
// Coverage ratio
// ---------------------------------------------------------------------------

/// A coverage ratio that is unbounded when nothing needs covering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageRatio {
    Finite(Decimal),
    Unbounded,
}

impl CoverageRatio {
    pub fn is_infinite(&self) -> bool {
        matches!(self, CoverageRatio::Unbounded)
    }

    pub fn finite(&self) -> Option<Decimal> {
        match self {
            CoverageRatio::Finite(d) => Some(*d),
            CoverageRatio::Unbounded => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            CoverageRatio::Finite(d) => d.to_f64().unwrap_or(f64::NAN),
            CoverageRatio::Unbounded => f64::INFINITY,
        }
    }

    /// Whether the ratio is at least `minimum`.
    pub fn meets(&self, minimum: Decimal) -> bool {
        match self {
            CoverageRatio::Finite(d) => *d >= minimum,
            CoverageRatio::Unbounded => true,
        }
    }
}

impl fmt::Display for CoverageRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageRatio::Finite(d) => write!(f, "{}", d),
            CoverageRatio::Unbounded => f.write_str("inf"),
        }
    }
}

impl Serialize for CoverageRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CoverageRatio::Finite(d) => Serialize::serialize(d, serializer),
            CoverageRatio::Unbounded => serializer.serialize_str("inf"),
        }
    }
}

impl<'de> Deserialize<'de> for CoverageRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(Decimal),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Number(d) => Ok(CoverageRatio::Finite(d)),
            Repr::Text(s)
                if s.eq_ignore_ascii_case("inf") || s.eq_ignore_ascii_case("infinity") =>
            {
                Ok(CoverageRatio::Unbounded)
            }
            Repr::Text(s) => Decimal::from_str(&s)
                .map(CoverageRatio::Finite)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// LCR = HQLA / net 30-day outflows; unbounded when there are no net outflows.
pub fn liquidity_coverage_ratio(
    hqla: Money,
    net_outflows_30d: Money,
) -> RiskAnalyticsResult<CoverageRatio> {
    if hqla < Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "hqla",
            format!("stock {} must be non-negative", hqla),
        ));
    }
    if net_outflows_30d < Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "net_outflows_30d",
            format!("net outflows {} must be non-negative", net_outflows_30d),
        ));
    }
    if net_outflows_30d.is_zero() {
        return Ok(CoverageRatio::Unbounded);
    }
    Ok(CoverageRatio::Finite(hqla / net_outflows_30d))
}

// ---------------------------------------------------------------------------
// LCR build-up from flows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LcrInput {
    pub hqla: HqlaPortfolio,
    #[serde(default)]
    pub cash_outflows: Vec<CashOutflow>,
    #[serde(default)]
    pub cash_inflows: Vec<CashInflow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HqlaPortfolio {
    /// Cash, central bank reserves, sovereign bonds
    #[serde(default)]
    pub level1_assets: Vec<HqlaAsset>,
    #[serde(default)]
    pub level2a_assets: Vec<HqlaAsset>,
    #[serde(default)]
    pub level2b_assets: Vec<HqlaAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HqlaAsset {
    pub name: String,
    pub market_value: Money,
    /// Overrides the level's standard haircut (L1 0%, L2A 15%, L2B 50%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub haircut: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashOutflow {
    pub category: OutflowCategory,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_off_rate: Option<Rate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutflowCategory {
    RetailStableDeposits,
    RetailLessStable,
    UnsecuredWholesaleOperational,
    UnsecuredWholesaleNonOperational,
    UnsecuredWholesaleFinancial,
    SecuredFunding,
    CommittedFacilities,
    Other,
}

impl OutflowCategory {
    /// Basel III run-off rate.
    fn standard_rate(&self) -> Rate {
        match self {
            Self::RetailStableDeposits => dec!(0.05),
            Self::RetailLessStable => dec!(0.10),
            Self::UnsecuredWholesaleOperational => dec!(0.25),
            Self::UnsecuredWholesaleNonOperational => dec!(0.40),
            Self::UnsecuredWholesaleFinancial => dec!(1.00),
            Self::SecuredFunding => dec!(0.00),
            Self::CommittedFacilities => dec!(0.10),
            Self::Other => dec!(1.00),
        }
    }
}

impl fmt::Display for OutflowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RetailStableDeposits => "Retail Stable Deposits",
            Self::RetailLessStable => "Retail Less Stable Deposits",
            Self::UnsecuredWholesaleOperational => "Unsecured Wholesale Operational",
            Self::UnsecuredWholesaleNonOperational => "Unsecured Wholesale Non-Operational",
            Self::UnsecuredWholesaleFinancial => "Unsecured Wholesale Financial",
            Self::SecuredFunding => "Secured Funding",
            Self::CommittedFacilities => "Committed Facilities",
            Self::Other => "Other Outflows",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashInflow {
    pub category: InflowCategory,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflow_rate: Option<Rate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InflowCategory {
    RetailLoans,
    WholesaleNonFinancial,
    WholesaleFinancial,
    SecuredLending,
    Other,
}

impl InflowCategory {
    fn standard_rate(&self) -> Rate {
        match self {
            Self::RetailLoans => dec!(0.50),
            Self::WholesaleNonFinancial => dec!(0.50),
            Self::WholesaleFinancial => dec!(1.00),
            Self::SecuredLending => dec!(0.00),
            Self::Other => dec!(0.50),
        }
    }
}

impl fmt::Display for InflowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RetailLoans => "Retail Loans",
            Self::WholesaleNonFinancial => "Wholesale Non-Financial",
            Self::WholesaleFinancial => "Wholesale Financial",
            Self::SecuredLending => "Secured Lending",
            Self::Other => "Other Inflows",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LcrOutput {
    pub total_hqla: Money,
    pub hqla_breakdown: HqlaBreakdown,
    pub total_outflows: Money,
    /// After the 75% cap.
    pub total_inflows: Money,
    pub net_outflows: Money,
    pub lcr_ratio: CoverageRatio,
    pub meets_requirement: bool,
    pub surplus_deficit: Money,
    pub outflow_details: Vec<FlowDetail>,
    pub inflow_details: Vec<FlowDetail>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HqlaBreakdown {
    pub level1: Money,
    pub level2a: Money,
    pub level2b: Money,
    pub level2_cap_applied: bool,
    pub level2b_cap_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDetail {
    pub category: String,
    pub gross_amount: Money,
    pub rate: Rate,
    pub weighted_amount: Money,
}

const HAIRCUT_L1: Rate = dec!(0.00);
const HAIRCUT_L2A: Rate = dec!(0.15);
const HAIRCUT_L2B: Rate = dec!(0.50);
/// Level 2 (2A + 2B) share of adjusted HQLA.
const LEVEL2_CAP_RATIO: Rate = dec!(0.40);
/// Level 2B share of adjusted HQLA.
const LEVEL2B_CAP_RATIO: Rate = dec!(0.15);
/// Inflows count up to this share of outflows.
const INFLOW_CAP_RATIO: Rate = dec!(0.75);
const LCR_MIN_REQUIREMENT: Rate = dec!(1.00);

/// Basel III LCR from HQLA holdings and categorised 30-day flows.
///
/// Net outflows = outflows - min(inflows, 0.75 * outflows).
pub fn lcr_from_flows(input: &LcrInput) -> RiskAnalyticsResult<LcrOutput> {
    validate_lcr_input(input)?;
    let mut warnings = Vec::new();

    let raw_l1 = sum_hqla_level(&input.hqla.level1_assets, HAIRCUT_L1);
    let raw_l2a = sum_hqla_level(&input.hqla.level2a_assets, HAIRCUT_L2A);
    let raw_l2b = sum_hqla_level(&input.hqla.level2b_assets, HAIRCUT_L2B);
    let caps = apply_hqla_caps(raw_l1, raw_l2a, raw_l2b, &mut warnings);
    let total_hqla = caps.level1 + caps.level2a + caps.level2b;

    let outflow_details: Vec<FlowDetail> = input
        .cash_outflows
        .iter()
        .map(|o| {
            weighted(
                o.category.to_string(),
                o.amount,
                o.run_off_rate.unwrap_or_else(|| o.category.standard_rate()),
            )
        })
        .collect();
    let inflow_details: Vec<FlowDetail> = input
        .cash_inflows
        .iter()
        .map(|i| {
            weighted(
                i.category.to_string(),
                i.amount,
                i.inflow_rate.unwrap_or_else(|| i.category.standard_rate()),
            )
        })
        .collect();

    let total_outflows: Money = outflow_details.iter().map(|d| d.weighted_amount).sum();
    let raw_inflows: Money = inflow_details.iter().map(|d| d.weighted_amount).sum();
    let inflow_cap = total_outflows * INFLOW_CAP_RATIO;
    let total_inflows = if raw_inflows > inflow_cap {
        warnings.push(format!(
            "Inflows capped at 75% of outflows: {} -> {}",
            raw_inflows, inflow_cap
        ));
        inflow_cap
    } else {
        raw_inflows
    };

    let net_outflows = total_outflows - total_inflows;
    let lcr_ratio = liquidity_coverage_ratio(total_hqla, net_outflows)?;

    Ok(LcrOutput {
        total_hqla,
        hqla_breakdown: caps,
        total_outflows,
        total_inflows,
        net_outflows,
        meets_requirement: lcr_ratio.meets(LCR_MIN_REQUIREMENT),
        lcr_ratio,
        surplus_deficit: total_hqla - net_outflows,
        outflow_details,
        inflow_details,
        warnings,
    })
}

fn weighted(category: String, amount: Money, rate: Rate) -> FlowDetail {
    FlowDetail {
        category,
        gross_amount: amount,
        rate,
        weighted_amount: amount * rate,
    }
}

fn sum_hqla_level(assets: &[HqlaAsset], default_haircut: Rate) -> Money {
    assets
        .iter()
        .map(|a| a.market_value * (Decimal::ONE - a.haircut.unwrap_or(default_haircut)))
        .sum()
}

/// Composition caps, applied L2B first:
/// L2B <= (L1 + L2A) * 0.15 / 0.85, then L2A + L2B <= L1 * 0.40 / 0.60.
fn apply_hqla_caps(l1: Money, l2a: Money, l2b: Money, warnings: &mut Vec<String>) -> HqlaBreakdown {
    let mut adj_l2a = l2a;
    let mut adj_l2b = l2b;
    let mut level2b_cap_applied = false;
    let mut level2_cap_applied = false;

    let l2b_max = (l1 + adj_l2a) * LEVEL2B_CAP_RATIO / (Decimal::ONE - LEVEL2B_CAP_RATIO);
    if adj_l2b > l2b_max {
        warnings.push(format!("Level 2B HQLA capped: {} -> {}", adj_l2b, l2b_max));
        adj_l2b = l2b_max;
        level2b_cap_applied = true;
    }

    let l2_total = adj_l2a + adj_l2b;
    let l2_max = l1 * LEVEL2_CAP_RATIO / (Decimal::ONE - LEVEL2_CAP_RATIO);
    if l2_total > l2_max {
        let excess = l2_total - l2_max;
        if excess <= adj_l2a {
            adj_l2a -= excess;
        } else {
            adj_l2a = Decimal::ZERO;
            adj_l2b = l2_max;
        }
        warnings.push(format!("Level 2 HQLA capped: {} -> {}", l2_total, l2_max));
        level2_cap_applied = true;
    }

    HqlaBreakdown {
        level1: l1,
        level2a: adj_l2a,
        level2b: adj_l2b,
        level2_cap_applied,
        level2b_cap_applied,
    }
}

fn validate_rate(field: String, rate: Option<Rate>) -> RiskAnalyticsResult<()> {
    if let Some(r) = rate {
        if r < Decimal::ZERO || r > Decimal::ONE {
            return Err(RiskAnalyticsError::validation(
                field,
                format!("rate {} must be in [0, 1]", r),
            ));
        }
    }
    Ok(())
}

fn validate_lcr_input(input: &LcrInput) -> RiskAnalyticsResult<()> {
    for asset in input
        .hqla
        .level1_assets
        .iter()
        .chain(input.hqla.level2a_assets.iter())
        .chain(input.hqla.level2b_assets.iter())
    {
        if asset.market_value < Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                "hqla.market_value",
                format!("asset '{}' has negative market value {}", asset.name, asset.market_value),
            ));
        }
        validate_rate(format!("hqla['{}'].haircut", asset.name), asset.haircut)?;
    }
    for (i, o) in input.cash_outflows.iter().enumerate() {
        if o.amount < Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                format!("cash_outflows[{}].amount", i),
                format!("'{}' has negative amount {}", o.category, o.amount),
            ));
        }
        validate_rate(format!("cash_outflows[{}].run_off_rate", i), o.run_off_rate)?;
    }
    for (i, f) in input.cash_inflows.iter().enumerate() {
        if f.amount < Decimal::ZERO {
            return Err(RiskAnalyticsError::validation(
                format!("cash_inflows[{}].amount", i),
                format!("'{}' has negative amount {}", f.category, f.amount),
            ));
        }
        validate_rate(format!("cash_inflows[{}].inflow_rate", i), f.inflow_rate)?;
    }
    Ok(())
}
