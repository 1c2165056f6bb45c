use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RiskAnalyticsError;
use crate::types::{Money, Rate};
use crate::RiskAnalyticsResult;

/// Components of a period total return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnDecomposition {
    pub total_return: Rate,
    pub income_return: Rate,
    pub price_return: Rate,
    pub currency_return: Rate,
}

/// Holding-period total return:
/// (end_mv + income - costs - begin_mv) / begin_mv.
pub fn total_return(
    begin_mv: Money,
    end_mv: Money,
    income: Money,
    costs: Money,
) -> RiskAnalyticsResult<Rate> {
    if begin_mv.is_zero() {
        return Err(RiskAnalyticsError::division(
            "total_return: beginning market value is zero",
        ));
    }
    Ok((end_mv + income - costs - begin_mv) / begin_mv)
}

/// Split a total return into income, currency and the price residual.
pub fn decompose_return(
    total: Rate,
    income_return: Rate,
    currency_return: Rate,
) -> ReturnDecomposition {
    ReturnDecomposition {
        total_return: total,
        income_return,
        price_return: total - income_return - currency_return,
        currency_return,
    }
}

/// Geometric linking of period returns: prod(1 + r_t) - 1.
pub fn compound_returns(period_returns: &[Rate]) -> Rate {
    period_returns
        .iter()
        .fold(Decimal::ONE, |acc, r| acc * (Decimal::ONE + *r))
        - Decimal::ONE
}
