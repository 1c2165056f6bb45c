use rust_decimal::Decimal;

use crate::error::RiskAnalyticsError;
use crate::math::{mean, sample_std, sqrt_decimal};
use crate::types::Rate;
use crate::RiskAnalyticsResult;

/// Sharpe ratio: (mean(returns) - rf) / sample stdev(returns).
///
/// `risk_free_rate` is per period, in the same units as `returns`.
pub fn sharpe_ratio(returns: &[Rate], risk_free_rate: Rate) -> RiskAnalyticsResult<Decimal> {
    let sd = sample_std(returns, "sharpe_ratio")?;
    if sd.is_zero() {
        return Err(RiskAnalyticsError::division(
            "sharpe_ratio: standard deviation of returns is zero",
        ));
    }
    Ok((mean(returns) - risk_free_rate) / sd)
}

/// Downside deviation below `threshold`: sqrt(sum_{r < t} (r - t)^2 / (n - 1)),
/// with n the full series length.
pub fn downside_deviation(returns: &[Rate], threshold: Rate) -> RiskAnalyticsResult<Decimal> {
    if returns.len() < 2 {
        return Err(RiskAnalyticsError::InsufficientData(format!(
            "downside_deviation requires at least 2 observations, got {}",
            returns.len()
        )));
    }
    let sum_sq: Decimal = returns
        .iter()
        .filter(|r| **r < threshold)
        .map(|r| (*r - threshold) * (*r - threshold))
        .sum();
    Ok(sqrt_decimal(
        sum_sq / Decimal::from((returns.len() - 1) as i64),
    ))
}

/// Sortino ratio: Sharpe numerator over downside deviation below the
/// risk-free rate. Fails when no observation falls below the threshold.
pub fn sortino_ratio(returns: &[Rate], risk_free_rate: Rate) -> RiskAnalyticsResult<Decimal> {
    let dd = downside_deviation(returns, risk_free_rate)?;
    if dd.is_zero() {
        return Err(RiskAnalyticsError::division(format!(
            "sortino_ratio: no return below threshold {}",
            risk_free_rate
        )));
    }
    Ok((mean(returns) - risk_free_rate) / dd)
}

/// Maximum peak-to-trough drawdown of a cumulative value series (NAV or
/// wealth index). Returns 0 for a non-decreasing series.
pub fn max_drawdown(cumulative_values: &[Decimal]) -> RiskAnalyticsResult<Decimal> {
    let first = cumulative_values.first().ok_or_else(|| {
        RiskAnalyticsError::InsufficientData("max_drawdown requires at least 1 value".into())
    })?;
    if let Some((i, v)) = cumulative_values
        .iter()
        .enumerate()
        .find(|(_, v)| **v <= Decimal::ZERO)
    {
        return Err(RiskAnalyticsError::validation(
            format!("cumulative_values[{}]", i),
            format!("value {} must be positive", v),
        ));
    }

    let mut peak = *first;
    let mut max_dd = Decimal::ZERO;
    for v in cumulative_values {
        if *v > peak {
            peak = *v;
        }
        let dd = (peak - *v) / peak;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    Ok(max_dd)
}

/// Max drawdown of periodic returns compounded into a wealth index from 1.
pub fn max_drawdown_from_returns(period_returns: &[Rate]) -> RiskAnalyticsResult<Decimal> {
    let mut wealth = Decimal::ONE;
    let mut path = Vec::with_capacity(period_returns.len() + 1);
    path.push(wealth);
    for r in period_returns {
        wealth *= Decimal::ONE + *r;
        path.push(wealth);
    }
    max_drawdown(&path)
}
