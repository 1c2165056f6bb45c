#![cfg(feature = "performance")]

use risk_analytics_core::performance::{benchmark, ratios, summary};
use risk_analytics_core::RiskAnalyticsError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn monthly_returns() -> Vec<Decimal> {
    vec![
        dec!(0.012),
        dec!(-0.004),
        dec!(0.021),
        dec!(0.008),
        dec!(-0.015),
        dec!(0.017),
        dec!(0.003),
        dec!(0.010),
    ]
}

fn monthly_benchmark() -> Vec<Decimal> {
    vec![
        dec!(0.010),
        dec!(-0.002),
        dec!(0.015),
        dec!(0.006),
        dec!(-0.012),
        dec!(0.011),
        dec!(0.004),
        dec!(0.007),
    ]
}

// ===========================================================================
// Single statistics
// ===========================================================================

#[test]
fn test_sharpe_and_sortino_positive_for_positive_excess() {
    let r = monthly_returns();
    assert!(ratios::sharpe_ratio(&r, dec!(0.001)).unwrap() > Decimal::ZERO);
    assert!(ratios::sortino_ratio(&r, dec!(0.001)).unwrap() > Decimal::ZERO);
}

#[test]
fn test_sharpe_needs_two_observations() {
    assert!(matches!(
        ratios::sharpe_ratio(&[dec!(0.01)], Decimal::ZERO),
        Err(RiskAnalyticsError::InsufficientData(_))
    ));
}

#[test]
fn test_max_drawdown_from_levels_and_returns_agree() {
    let levels = vec![dec!(1), dec!(1.1), dec!(0.88), dec!(0.99)];
    assert_eq!(ratios::max_drawdown(&levels).unwrap(), dec!(0.2));
    let from_returns =
        ratios::max_drawdown_from_returns(&[dec!(0.1), dec!(-0.2), dec!(0.125)]).unwrap();
    assert_eq!(from_returns, dec!(0.2));
}

#[test]
fn test_information_ratio_from_active_series() {
    let active = benchmark::active_returns(&monthly_returns(), &monthly_benchmark()).unwrap();
    assert_eq!(active.len(), 8);
    assert_eq!(active[0], dec!(0.002));
    let te = benchmark::tracking_error(&active).unwrap();
    assert!(te > Decimal::ZERO);
    assert!(benchmark::information_ratio(&active).unwrap() > Decimal::ZERO);
}

#[test]
fn test_active_returns_length_mismatch() {
    assert!(matches!(
        benchmark::active_returns(&[dec!(0.01)], &[dec!(0.01), dec!(0.02)]),
        Err(RiskAnalyticsError::Structural { .. })
    ));
}

// ===========================================================================
// Summary
// ===========================================================================

#[test]
fn test_summary_with_benchmark_populates_relative_statistics() {
    let out = summary::risk_adjusted_summary(&summary::RiskAdjustedInput {
        returns: monthly_returns(),
        risk_free_rate: dec!(0.02),
        benchmark_returns: Some(monthly_benchmark()),
        frequency: summary::ReturnFrequency::Monthly,
        target_return: None,
    })
    .unwrap();
    assert!(out.tracking_error.is_some());
    assert!(out.information_ratio.is_some());
    assert!(out.beta.unwrap() > Decimal::ONE);
    assert!(out.max_drawdown > Decimal::ZERO);
}
