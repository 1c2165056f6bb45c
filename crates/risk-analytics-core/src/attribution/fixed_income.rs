use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Bps, Rate, Years};

const BPS_PER_UNIT: Decimal = dec!(10000);

/// Spread-duration positioning for the spread leg of fixed-income attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadExposure {
    pub portfolio_spread_duration: Years,
    pub benchmark_spread_duration: Years,
    pub spread_change_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationAttributionInput {
    pub portfolio_duration: Years,
    pub benchmark_duration: Years,
    /// Parallel rate move over the period, in basis points.
    pub rate_change_bps: Bps,
    pub portfolio_return: Rate,
    pub benchmark_return: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<SpreadExposure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationAttribution {
    pub active_return: Rate,
    pub duration_effect: Decimal,
    pub spread_effect: Decimal,
    /// Whatever the rate and spread legs do not explain (carry, selection).
    pub residual: Decimal,
}

/// Decompose active fixed-income return into duration, spread and residual
/// legs. The three components always sum to `portfolio_return -
/// benchmark_return`. Negative durations (short overlays) are accepted.
pub fn duration_attribution(input: &DurationAttributionInput) -> DurationAttribution {
    let active_return = input.portfolio_return - input.benchmark_return;
    let duration_effect = -(input.portfolio_duration - input.benchmark_duration)
        * input.rate_change_bps
        / BPS_PER_UNIT;

    let spread_effect = match &input.spread {
        Some(s) => {
            -(s.portfolio_spread_duration - s.benchmark_spread_duration) * s.spread_change_bps
                / BPS_PER_UNIT
        }
        None => Decimal::ZERO,
    };

    DurationAttribution {
        active_return,
        duration_effect,
        spread_effect,
        residual: active_return - duration_effect - spread_effect,
    }
}
