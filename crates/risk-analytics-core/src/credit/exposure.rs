use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::RiskAnalyticsError;
use crate::types::{Money, Rate};
use crate::RiskAnalyticsResult;

/// Credit conversion factor applied to undrawn commitments when none is given.
pub const DEFAULT_CCF: Rate = dec!(0.75);

/// Funded exposure is carried at its outstanding balance.
pub fn ead_on_balance(outstanding: Money) -> Money {
    outstanding
}

/// EAD = drawn + CCF x (committed - drawn).
pub fn ead_off_balance(
    committed: Money,
    drawn: Money,
    ccf: Option<Rate>,
) -> RiskAnalyticsResult<Money> {
    let ccf = ccf.unwrap_or(DEFAULT_CCF);
    if drawn < Decimal::ZERO {
        return Err(RiskAnalyticsError::validation(
            "drawn",
            format!("drawn amount {} must be non-negative", drawn),
        ));
    }
    if committed < drawn {
        return Err(RiskAnalyticsError::validation(
            "committed",
            format!("commitment {} is below drawn amount {}", committed, drawn),
        ));
    }
    if ccf < Decimal::ZERO || ccf > Decimal::ONE {
        return Err(RiskAnalyticsError::validation(
            "ccf",
            format!("conversion factor {} must be in [0, 1]", ccf),
        ));
    }
    Ok(drawn + ccf * (committed - drawn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_balance_identity() {
        assert_eq!(ead_on_balance(dec!(1234.56)), dec!(1234.56));
    }

    #[test]
    fn test_off_balance_default_ccf() {
        // 400 + 0.75 * 600
        assert_eq!(ead_off_balance(dec!(1000), dec!(400), None).unwrap(), dec!(850));
    }

    #[test]
    fn test_off_balance_fully_drawn() {
        assert_eq!(
            ead_off_balance(dec!(500), dec!(500), Some(dec!(0.2))).unwrap(),
            dec!(500)
        );
    }

    #[test]
    fn test_off_balance_rejects_overdrawn() {
        assert!(matches!(
            ead_off_balance(dec!(100), dec!(150), None),
            Err(RiskAnalyticsError::Validation { .. })
        ));
    }

    #[test]
    fn test_off_balance_rejects_negative_drawn() {
        assert!(matches!(
            ead_off_balance(dec!(100), dec!(-1), None),
            Err(RiskAnalyticsError::Validation { .. })
        ));
    }

    #[test]
    fn test_off_balance_rejects_ccf_out_of_range() {
        assert!(ead_off_balance(dec!(100), dec!(50), Some(dec!(1.5))).is_err());
    }
}
