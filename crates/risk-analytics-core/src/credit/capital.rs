use rust_decimal::Decimal;

use crate::error::RiskAnalyticsError;
use crate::math::sqrt_decimal;
use crate::types::{Money, Rate};
use crate::RiskAnalyticsResult;

fn validate_unit_interval(field: &str, value: Decimal) -> RiskAnalyticsResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(RiskAnalyticsError::validation(
            field,
            format!("{} must be in [0, 1]", value),
        ));
    }
    Ok(())
}

fn validate_loss_inputs(pd: Rate, lgd: Rate, ead: Money) -> RiskAnalyticsResult<()> {
    validate_unit_interval("pd", pd)?;
    validate_unit_interval("lgd", lgd)?;
    if ead < Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "ead",
            format!("exposure {} must be non-negative", ead),
        ));
    }
    Ok(())
}

/// EL = PD x LGD x EAD.
pub fn expected_loss(pd: Rate, lgd: Rate, ead: Money) -> RiskAnalyticsResult<Money> {
    validate_loss_inputs(pd, lgd, ead)?;
    Ok(pd * lgd * ead)
}

/// One-standard-deviation loss around EL.
///
/// With LGD volatility: `EAD * sqrt(PD * lgd_vol^2 + LGD^2 * PD * (1 - PD))`,
/// otherwise `EAD * LGD * sqrt(PD * (1 - PD))`.
pub fn unexpected_loss(
    pd: Rate,
    lgd: Rate,
    ead: Money,
    lgd_vol: Option<Rate>,
) -> RiskAnalyticsResult<Money> {
    validate_loss_inputs(pd, lgd, ead)?;
    let lgd_vol = lgd_vol.unwrap_or(Decimal::ZERO);
    if lgd_vol < Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "lgd_vol",
            format!("volatility {} must be non-negative", lgd_vol),
        ));
    }

    let default_variance = pd * (Decimal::ONE - pd);
    if lgd_vol > Decimal::ZERO {
        Ok(ead * sqrt_decimal(pd * lgd_vol * lgd_vol + lgd * lgd * default_variance))
    } else {
        Ok(ead * lgd * sqrt_decimal(default_variance))
    }
}

/// RAROC = (revenue - EL - operating cost) / economic capital.
pub fn raroc(
    revenue: Money,
    expected_loss: Money,
    operating_cost: Money,
    economic_capital: Money,
) -> RiskAnalyticsResult<Rate> {
    if economic_capital.is_zero() {
        return Err(RiskAnalyticsError::division("raroc: economic_capital"));
    }
    Ok((revenue - expected_loss - operating_cost) / economic_capital)
}
