use rust_decimal::Decimal;

use crate::error::RiskAnalyticsError;
use crate::math::{mean, sample_std, sample_variance};
use crate::types::Rate;
use crate::RiskAnalyticsResult;

/// Single-period active return.
pub fn active_return(portfolio: Rate, benchmark: Rate) -> Rate {
    portfolio - benchmark
}

/// Period-by-period active returns of two aligned series.
pub fn active_returns(portfolio: &[Rate], benchmark: &[Rate]) -> RiskAnalyticsResult<Vec<Rate>> {
    if portfolio.len() != benchmark.len() {
        return Err(RiskAnalyticsError::structural(
            "benchmark_returns",
            format!(
                "benchmark has {} observations, portfolio has {}",
                benchmark.len(),
                portfolio.len()
            ),
        ));
    }
    Ok(portfolio
        .iter()
        .zip(benchmark.iter())
        .map(|(p, b)| active_return(*p, *b))
        .collect())
}

/// Tracking error: sample standard deviation of active returns.
pub fn tracking_error(active_returns: &[Rate]) -> RiskAnalyticsResult<Decimal> {
    sample_std(active_returns, "tracking_error")
}

/// Information ratio: mean(active) / tracking_error(active).
pub fn information_ratio(active_returns: &[Rate]) -> RiskAnalyticsResult<Decimal> {
    let te = tracking_error(active_returns)?;
    if te.is_zero() {
        return Err(RiskAnalyticsError::division(
            "information_ratio: tracking error is zero",
        ));
    }
    Ok(mean(active_returns) / te)
}

/// Beta of `returns` against `benchmark`: sample cov / sample var(benchmark).
pub fn beta(returns: &[Rate], benchmark: &[Rate]) -> RiskAnalyticsResult<Decimal> {
    if returns.len() != benchmark.len() {
        return Err(RiskAnalyticsError::structural(
            "benchmark_returns",
            format!(
                "benchmark has {} observations, portfolio has {}",
                benchmark.len(),
                returns.len()
            ),
        ));
    }
    if returns.len() < 2 {
        return Err(RiskAnalyticsError::InsufficientData(format!(
            "beta requires at least 2 observations, got {}",
            returns.len()
        )));
    }
    let mean_p = mean(returns);
    let mean_b = mean(benchmark);
    let cov: Decimal = returns
        .iter()
        .zip(benchmark.iter())
        .map(|(p, b)| (*p - mean_p) * (*b - mean_b))
        .sum::<Decimal>()
        / Decimal::from((returns.len() - 1) as i64);
    let var_b = sample_variance(benchmark, mean_b);
    if var_b.is_zero() {
        return Err(RiskAnalyticsError::division(
            "beta: benchmark variance is zero",
        ));
    }
    Ok(cov / var_b)
}
