use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RiskAnalyticsError;
use crate::types::{Money, Rate, Years};
use crate::RiskAnalyticsResult;

// ---------------------------------------------------------------------------
// Workout LGD
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutLgdInput {
    pub collateral_value: Money,
    pub exposure: Money,
    #[serde(default)]
    pub recovery_costs: Money,
    #[serde(default = "default_time_to_recovery")]
    pub time_to_recovery_years: Years,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Rate,
}

fn default_time_to_recovery() -> Years {
    Decimal::ONE
}

fn default_discount_rate() -> Rate {
    dec!(0.05)
}

impl WorkoutLgdInput {
    /// Input with no recovery costs, one year to recovery, discounted at 5%.
    pub fn new(collateral_value: Money, exposure: Money) -> Self {
        WorkoutLgdInput {
            collateral_value,
            exposure,
            recovery_costs: Decimal::ZERO,
            time_to_recovery_years: default_time_to_recovery(),
            discount_rate: default_discount_rate(),
        }
    }
}

/// LGD = 1 - (collateral - costs) / (1 + r)^t / exposure, clamped to [0, 1].
pub fn workout_lgd(input: &WorkoutLgdInput) -> RiskAnalyticsResult<Rate> {
    if input.exposure.is_zero() {
        return Err(RiskAnalyticsError::division("workout_lgd: exposure"));
    }
    if input.exposure < Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "exposure",
            format!("exposure {} must be positive", input.exposure),
        ));
    }
    if input.time_to_recovery_years < Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "time_to_recovery_years",
            format!("{} must be non-negative", input.time_to_recovery_years),
        ));
    }
    let growth = Decimal::ONE + input.discount_rate;
    if growth <= Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "discount_rate",
            format!("rate {} must exceed -100%", input.discount_rate),
        ));
    }

    let compound = growth
        .checked_powd(input.time_to_recovery_years)
        .ok_or_else(|| {
            RiskAnalyticsError::validation(
                "time_to_recovery_years",
                "discount factor overflows",
            )
        })?;
    if compound.is_zero() {
        return Err(RiskAnalyticsError::division("workout_lgd: discount factor"));
    }

    let recovered_pv = (input.collateral_value - input.recovery_costs) / compound;
    let lgd = Decimal::ONE - recovered_pv / input.exposure;
    Ok(lgd.max(Decimal::ZERO).min(Decimal::ONE))
}

// ---------------------------------------------------------------------------
// Market LGD table
// ---------------------------------------------------------------------------

/// Claim seniority in the capital structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Seniority {
    #[default]
    SeniorSecured,
    SeniorUnsecured,
    Subordinated,
    JuniorSubordinated,
}

impl Seniority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Seniority::SeniorSecured => "SENIOR_SECURED",
            Seniority::SeniorUnsecured => "SENIOR_UNSECURED",
            Seniority::Subordinated => "SUBORDINATED",
            Seniority::JuniorSubordinated => "JUNIOR_SUBORDINATED",
        }
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Seniority {
    type Err = RiskAnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SENIOR_SECURED" => Ok(Seniority::SeniorSecured),
            "SENIOR_UNSECURED" => Ok(Seniority::SeniorUnsecured),
            "SUBORDINATED" => Ok(Seniority::Subordinated),
            "JUNIOR_SUBORDINATED" => Ok(Seniority::JuniorSubordinated),
            _ => Err(RiskAnalyticsError::not_found("seniority", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LgdEntry {
    pub rating: String,
    pub seniority: Seniority,
    pub lgd: Rate,
}

/// Loss-given-default rates keyed by (rating, seniority). Serialised as a
/// plain list of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LgdEntry>", into = "Vec<LgdEntry>")]
pub struct LgdTable {
    entries: Vec<LgdEntry>,
}

impl TryFrom<Vec<LgdEntry>> for LgdTable {
    type Error = RiskAnalyticsError;

    fn try_from(entries: Vec<LgdEntry>) -> Result<Self, Self::Error> {
        LgdTable::new(entries)
    }
}

impl From<LgdTable> for Vec<LgdEntry> {
    fn from(table: LgdTable) -> Self {
        table.entries
    }
}

impl LgdTable {
    /// Rejects rates outside [0, 1] and duplicate keys.
    pub fn new(entries: Vec<LgdEntry>) -> RiskAnalyticsResult<Self> {
        for (i, e) in entries.iter().enumerate() {
            if e.lgd < Decimal::ZERO || e.lgd > Decimal::ONE {
                return Err(RiskAnalyticsError::validation(
                    format!("lgd_table[{}].lgd", i),
                    format!("rate {} must be in [0, 1]", e.lgd),
                ));
            }
            if entries[..i]
                .iter()
                .any(|p| p.rating == e.rating && p.seniority == e.seniority)
            {
                return Err(RiskAnalyticsError::validation(
                    format!("lgd_table[{}]", i),
                    format!("duplicate entry for ({}, {})", e.rating, e.seniority),
                ));
            }
        }
        Ok(LgdTable { entries })
    }

    pub fn entries(&self) -> &[LgdEntry] {
        &self.entries
    }

    pub fn lookup(&self, rating: &str, seniority: Seniority) -> Option<Rate> {
        self.entries
            .iter()
            .find(|e| e.rating == rating && e.seniority == seniority)
            .map(|e| e.lgd)
    }
}

/// Look up the market LGD for a rating; seniority defaults to senior secured.
pub fn market_lgd(
    table: &LgdTable,
    rating: &str,
    seniority: Option<Seniority>,
) -> RiskAnalyticsResult<Rate> {
    let seniority = seniority.unwrap_or_default();
    table
        .lookup(rating, seniority)
        .ok_or_else(|| RiskAnalyticsError::not_found("lgd", format!("{}/{}", rating, seniority)))
}
