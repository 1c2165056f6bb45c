#![cfg(feature = "attribution")]

use risk_analytics_core::attribution::{brinson, fixed_income, returns};
use risk_analytics_core::{RiskAnalyticsError, WeightVector};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn map(pairs: &[(&str, Decimal)]) -> WeightVector {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// ===========================================================================
// Total return
// ===========================================================================

#[test]
fn test_total_return_reference_values() {
    assert_eq!(returns::total_return(dec!(100), dec!(110), dec!(5), dec!(0)).unwrap(), dec!(0.15));
    assert_eq!(returns::total_return(dec!(100), dec!(90), dec!(0), dec!(0)).unwrap(), dec!(-0.10));
    assert!(matches!(
        returns::total_return(dec!(0), dec!(100), dec!(0), dec!(0)),
        Err(RiskAnalyticsError::DivisionByZero { .. })
    ));
}

#[test]
fn test_decomposition_closes() {
    let d = returns::decompose_return(dec!(0.12), dec!(0.03), dec!(-0.01));
    assert_eq!(d.price_return + d.income_return + d.currency_return, d.total_return);
    assert_eq!(d.price_return, dec!(0.10));
}

// ===========================================================================
// Brinson
// ===========================================================================

fn sectors(equity: Decimal, bonds: Decimal, cash: Decimal) -> WeightVector {
    map(&[("Equity", equity), ("Bonds", bonds), ("Cash", cash)])
}

fn three_sector_period(eq_return: Decimal) -> brinson::BrinsonInput {
    brinson::BrinsonInput {
        portfolio_weights: sectors(dec!(0.6), dec!(0.3), dec!(0.1)),
        benchmark_weights: sectors(dec!(0.5), dec!(0.4), dec!(0.1)),
        portfolio_returns: sectors(eq_return, dec!(0.03), dec!(0.01)),
        benchmark_returns: sectors(dec!(0.08), dec!(0.04), dec!(0.01)),
        weight_tolerance: None,
    }
}

#[test]
fn test_brinson_effects_sum_to_active_return() {
    let out = brinson::brinson_attribution(&three_sector_period(dec!(0.10))).unwrap();
    let effects = out.total_allocation + out.total_selection + out.total_interaction;
    assert!((effects - out.active_return).abs() < dec!(0.000000001));
    let per_sector: Decimal = out.sectors.iter().map(|s| s.total_effect).sum();
    assert!((per_sector - out.active_return).abs() < dec!(0.000000001));
}

#[test]
fn test_brinson_is_deterministic() {
    let input = three_sector_period(dec!(0.10));
    let a = brinson::brinson_attribution(&input).unwrap();
    let b = brinson::brinson_attribution(&input).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_linked_attribution_matches_compounded_active_return() {
    let periods = vec![three_sector_period(dec!(0.10)), three_sector_period(dec!(-0.02))];
    let linked = brinson::link_attribution(&periods).unwrap();
    let effects = linked.allocation + linked.selection + linked.interaction;
    assert!((effects - linked.active_return).abs() < dec!(0.000000001));
    assert_eq!(linked.periods.len(), 2);
}

// ===========================================================================
// Duration attribution
// ===========================================================================

#[test]
fn test_duration_attribution_closes_with_spread_leg() {
    let out = fixed_income::duration_attribution(&fixed_income::DurationAttributionInput {
        portfolio_duration: dec!(6),
        benchmark_duration: dec!(5),
        rate_change_bps: dec!(-25),
        portfolio_return: dec!(0.021),
        benchmark_return: dec!(0.015),
        spread: Some(fixed_income::SpreadExposure {
            portfolio_spread_duration: dec!(4),
            benchmark_spread_duration: dec!(3),
            spread_change_bps: dec!(10),
        }),
    });
    // -(6 - 5) * -0.0025 and -(4 - 3) * 0.0010
    assert_eq!(out.duration_effect, dec!(0.0025));
    assert_eq!(out.spread_effect, dec!(-0.001));
    assert_eq!(out.duration_effect + out.spread_effect + out.residual, out.active_return);
}
