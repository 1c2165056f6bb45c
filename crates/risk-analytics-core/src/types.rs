use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Basis points (100 bps = 1%)
pub type Bps = Decimal;

/// Identifier (sector, instrument, rating) to weight. Totals are not
/// required to be 1; each consumer states its own policy.
pub type WeightVector = BTreeMap<String, Decimal>;

/// Identifier to per-period return.
pub type ReturnMap = BTreeMap<String, Rate>;

/// A named, non-negative exposure amount. Order is significant: tie-breaks
/// in ranking functions follow input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    pub id: String,
    pub amount: Money,
    /// Optional grouping label (sector, region) for grouped concentration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Exposure {
    pub fn new(id: impl Into<String>, amount: Money) -> Self {
        Exposure {
            id: id.into(),
            amount,
            group: None,
        }
    }

    pub fn grouped(id: impl Into<String>, amount: Money, group: impl Into<String>) -> Self {
        Exposure {
            id: id.into(),
            amount,
            group: Some(group.into()),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata. Timing is measured by
/// the caller; the analytics functions themselves never read a clock.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
