use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::benchmark::{active_returns, beta, information_ratio, tracking_error};
use super::ratios::{downside_deviation, max_drawdown_from_returns};
use crate::error::RiskAnalyticsError;
use crate::math::{mean, sample_variance, sqrt_decimal};
use crate::types::Rate;
use crate::RiskAnalyticsResult;

/// Frequency of return observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl ReturnFrequency {
    /// Number of periods in a year for annualisation
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            ReturnFrequency::Daily => dec!(252),
            ReturnFrequency::Weekly => dec!(52),
            ReturnFrequency::Monthly => dec!(12),
            ReturnFrequency::Quarterly => dec!(4),
            ReturnFrequency::Annual => dec!(1),
        }
    }
}

impl std::str::FromStr for ReturnFrequency {
    type Err = RiskAnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(ReturnFrequency::Daily),
            "weekly" => Ok(ReturnFrequency::Weekly),
            "monthly" => Ok(ReturnFrequency::Monthly),
            "quarterly" => Ok(ReturnFrequency::Quarterly),
            "annual" | "annually" => Ok(ReturnFrequency::Annual),
            other => Err(RiskAnalyticsError::Configuration {
                key: "frequency".into(),
                reason: format!(
                    "unknown frequency '{}'; use daily, weekly, monthly, quarterly, annual",
                    other
                ),
            }),
        }
    }
}

/// Input for the annualised risk-adjusted summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAdjustedInput {
    /// Periodic returns (as decimals, e.g. 0.05 = 5%)
    pub returns: Vec<Rate>,
    /// Risk-free rate (annualised)
    pub risk_free_rate: Rate,
    /// Benchmark returns (same frequency as `returns`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark_returns: Option<Vec<Rate>>,
    pub frequency: ReturnFrequency,
    /// Target return for Sortino (annualised); defaults to risk_free_rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_return: Option<Rate>,
}

/// Annualised statistics. A ratio whose denominator is zero is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAdjustedOutput {
    pub annualised_return: Rate,
    pub annualised_volatility: Rate,
    pub sharpe_ratio: Option<Decimal>,
    pub sortino_ratio: Option<Decimal>,
    pub calmar_ratio: Option<Decimal>,
    pub max_drawdown: Rate,
    pub downside_deviation: Rate,
    pub tracking_error: Option<Rate>,
    pub information_ratio: Option<Decimal>,
    pub beta: Option<Decimal>,
    pub alpha: Option<Rate>,
    pub treynor_ratio: Option<Decimal>,
}

/// Annualised return, volatility and the standard ratio set in one pass.
pub fn risk_adjusted_summary(input: &RiskAdjustedInput) -> RiskAnalyticsResult<RiskAdjustedOutput> {
    let n = input.returns.len();
    if n < 2 {
        return Err(RiskAnalyticsError::InsufficientData(
            "At least 2 return observations required".into(),
        ));
    }

    let periods = input.frequency.periods_per_year();
    let sqrt_periods = sqrt_decimal(periods);

    let mean_return = mean(&input.returns);
    let annualised_return = mean_return * periods;
    let std_dev = sqrt_decimal(sample_variance(&input.returns, mean_return));
    let annualised_volatility = std_dev * sqrt_periods;

    let sharpe_ratio = ratio(annualised_return - input.risk_free_rate, annualised_volatility);

    let target_per_period = input.target_return.unwrap_or(input.risk_free_rate) / periods;
    let downside = downside_deviation(&input.returns, target_per_period)? * sqrt_periods;
    let sortino_ratio = ratio(annualised_return - input.risk_free_rate, downside);

    let max_dd = max_drawdown_from_returns(&input.returns)?;
    let calmar_ratio = ratio(annualised_return, max_dd);

    let (tracking, info, beta_val, alpha, treynor_ratio) = match &input.benchmark_returns {
        Some(bench) => {
            let active = active_returns(&input.returns, bench)?;
            let te = tracking_error(&active)? * sqrt_periods;
            let ir = information_ratio(&active).ok().map(|ir| ir * sqrt_periods);
            let b = beta(&input.returns, bench).ok();
            let bench_annual = mean(bench) * periods;
            let alpha = b.map(|b| {
                annualised_return
                    - (input.risk_free_rate + b * (bench_annual - input.risk_free_rate))
            });
            let treynor = b.and_then(|b| ratio(annualised_return - input.risk_free_rate, b));
            (Some(te), ir, b, alpha, treynor)
        }
        None => (None, None, None, None, None),
    };

    Ok(RiskAdjustedOutput {
        annualised_return,
        annualised_volatility,
        sharpe_ratio,
        sortino_ratio,
        calmar_ratio,
        max_drawdown: max_dd,
        downside_deviation: downside,
        tracking_error: tracking,
        information_ratio: info,
        beta: beta_val,
        alpha,
        treynor_ratio,
    })
}

fn ratio(num: Decimal, denom: Decimal) -> Option<Decimal> {
    if denom.is_zero() {
        None
    } else {
        Some(num / denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_returns() -> Vec<Decimal> {
        vec![
            dec!(0.05),
            dec!(-0.02),
            dec!(0.03),
            dec!(0.01),
            dec!(-0.01),
            dec!(0.04),
            dec!(0.02),
            dec!(-0.03),
            dec!(0.06),
            dec!(0.01),
            dec!(-0.02),
            dec!(0.03),
        ]
    }

    fn monthly(returns: Vec<Decimal>) -> RiskAdjustedInput {
        RiskAdjustedInput {
            returns,
            risk_free_rate: dec!(0.02),
            benchmark_returns: None,
            frequency: ReturnFrequency::Monthly,
            target_return: None,
        }
    }

    #[test]
    fn test_basic_summary() {
        let out = risk_adjusted_summary(&monthly(sample_returns())).unwrap();
        // sum of monthly returns is 0.17, so the annualised mean is 0.17
        assert!((out.annualised_return - dec!(0.17)).abs() < dec!(0.000000000001));
        assert!(out.annualised_volatility > Decimal::ZERO);
        assert!(out.sharpe_ratio.unwrap() > Decimal::ZERO);
        assert!(out.max_drawdown > Decimal::ZERO);
        assert!(out.tracking_error.is_none());
    }

    #[test]
    fn test_sharpe_direction() {
        let high = monthly(vec![dec!(0.10), dec!(0.08), dec!(0.12), dec!(0.09)]);
        let low = monthly(vec![dec!(0.01), dec!(-0.01), dec!(0.02), dec!(0.00)]);
        let h = risk_adjusted_summary(&high).unwrap();
        let l = risk_adjusted_summary(&low).unwrap();
        assert!(h.sharpe_ratio.unwrap() > l.sharpe_ratio.unwrap());
    }

    #[test]
    fn test_no_downside_reports_none() {
        let mut input = monthly(vec![dec!(0.05), dec!(0.05), dec!(0.05)]);
        input.risk_free_rate = Decimal::ZERO;
        let out = risk_adjusted_summary(&input).unwrap();
        assert!(out.sortino_ratio.is_none());
        assert!(out.sharpe_ratio.is_none());
        assert!(out.calmar_ratio.is_none());
    }

    #[test]
    fn test_with_benchmark() {
        let mut input = monthly(sample_returns());
        input.benchmark_returns = Some(vec![
            dec!(0.04),
            dec!(-0.01),
            dec!(0.02),
            dec!(0.00),
            dec!(-0.02),
            dec!(0.03),
            dec!(0.01),
            dec!(-0.02),
            dec!(0.05),
            dec!(0.00),
            dec!(-0.01),
            dec!(0.02),
        ]);
        let out = risk_adjusted_summary(&input).unwrap();
        assert!(out.beta.is_some());
        assert!(out.alpha.is_some());
        assert!(out.tracking_error.is_some());
        assert!(out.information_ratio.is_some());
        assert!(out.treynor_ratio.is_some());
    }

    #[test]
    fn test_benchmark_length_mismatch() {
        let mut input = monthly(vec![dec!(0.05), dec!(0.03)]);
        input.benchmark_returns = Some(vec![dec!(0.04)]);
        assert!(matches!(
            risk_adjusted_summary(&input),
            Err(RiskAnalyticsError::Structural { .. })
        ));
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!("Monthly".parse::<ReturnFrequency>().unwrap(), ReturnFrequency::Monthly);
        assert!(matches!(
            "hourly".parse::<ReturnFrequency>(),
            Err(RiskAnalyticsError::Configuration { .. })
        ));
    }
}
