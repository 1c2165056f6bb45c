use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RiskAnalyticsError;
use crate::RiskAnalyticsResult;

/// Keys accepted by [`OptimizationConstraints::from_json`].
pub const RECOGNISED_KEYS: [&str; 4] = ["long_only", "max_weight", "sum_to_one", "target_return"];

/// Closed set of optimizer constraints. Anything else is a configuration
/// error, never silently ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizationConstraints {
    /// No short selling (w_i >= 0).
    #[serde(default)]
    pub long_only: bool,
    /// Per-asset weight cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<Decimal>,
    /// Fully invested (sum w_i = 1).
    #[serde(default = "default_sum_to_one")]
    pub sum_to_one: bool,
    /// Minimise variance subject to w'mu = target_return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_return: Option<Decimal>,
}

fn default_sum_to_one() -> bool {
    true
}

impl Default for OptimizationConstraints {
    fn default() -> Self {
        OptimizationConstraints {
            long_only: false,
            max_weight: None,
            sum_to_one: true,
            target_return: None,
        }
    }
}

impl OptimizationConstraints {
    /// Build from an untyped JSON object, naming the first unrecognised key.
    pub fn from_json(value: &serde_json::Value) -> RiskAnalyticsResult<Self> {
        let map = match value {
            serde_json::Value::Null => return Ok(Self::default()),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(RiskAnalyticsError::Configuration {
                    key: "constraints".into(),
                    reason: format!("expected an object, got {}", other),
                })
            }
        };

        let mut out = Self::default();
        for (key, val) in map {
            match key.as_str() {
                "long_only" => out.long_only = parse_bool(key, val)?,
                "sum_to_one" => out.sum_to_one = parse_bool(key, val)?,
                "max_weight" => out.max_weight = parse_decimal(key, val)?,
                "target_return" => out.target_return = parse_decimal(key, val)?,
                _ => {
                    return Err(RiskAnalyticsError::Configuration {
                        key: key.clone(),
                        reason: format!(
                            "unrecognised constraint; expected one of {:?}",
                            RECOGNISED_KEYS
                        ),
                    })
                }
            }
        }
        Ok(out)
    }

    pub(crate) fn validate(&self) -> RiskAnalyticsResult<()> {
        if let Some(c) = self.max_weight {
            if c <= Decimal::ZERO {
                return Err(RiskAnalyticsError::validation(
                    "constraints.max_weight",
                    format!("cap {} must be positive", c),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn lower_bound(&self) -> Option<Decimal> {
        if self.long_only {
            Some(Decimal::ZERO)
        } else {
            None
        }
    }
}

fn parse_bool(key: &str, val: &serde_json::Value) -> RiskAnalyticsResult<bool> {
    val.as_bool().ok_or_else(|| RiskAnalyticsError::Configuration {
        key: key.to_string(),
        reason: format!("expected a boolean, got {}", val),
    })
}

fn parse_decimal(key: &str, val: &serde_json::Value) -> RiskAnalyticsResult<Option<Decimal>> {
    if val.is_null() {
        return Ok(None);
    }
    serde_json::from_value::<Decimal>(val.clone())
        .map(Some)
        .map_err(|e| RiskAnalyticsError::Configuration {
            key: key.to_string(),
            reason: format!("expected a number: {}", e),
        })
}

/// Iteration cap and convergence tolerance for the iterative solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub max_iterations: u32,
    pub tolerance: Decimal,
}

impl SolverConfig {
    /// Projected-gradient mean-variance defaults.
    pub fn optimizer() -> Self {
        SolverConfig {
            max_iterations: 10_000,
            tolerance: dec!(0.0000000001),
        }
    }

    /// Coordinate-descent risk-parity defaults.
    pub fn risk_parity() -> Self {
        SolverConfig {
            max_iterations: 1_000,
            tolerance: dec!(0.000000000001),
        }
    }

    pub(crate) fn validate(&self) -> RiskAnalyticsResult<()> {
        if self.max_iterations == 0 {
            return Err(RiskAnalyticsError::Configuration {
                key: "solver.max_iterations".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.tolerance <= Decimal::ZERO {
            return Err(RiskAnalyticsError::Configuration {
                key: "solver.tolerance".into(),
                reason: format!("tolerance {} must be positive", self.tolerance),
            });
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::optimizer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_recognised() {
        let c = OptimizationConstraints::from_json(&json!({
            "long_only": true,
            "max_weight": 0.4,
            "sum_to_one": true,
            "target_return": "0.07"
        }))
        .unwrap();
        assert_eq!(
            c,
            OptimizationConstraints {
                long_only: true,
                max_weight: Some(dec!(0.4)),
                sum_to_one: true,
                target_return: Some(dec!(0.07)),
            }
        );
    }

    #[test]
    fn test_from_json_unknown_key() {
        let err = OptimizationConstraints::from_json(&json!({ "min_weight": 0.1 })).unwrap_err();
        match err {
            RiskAnalyticsError::Configuration { key, .. } => assert_eq!(key, "min_weight"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_json_wrong_type() {
        assert!(matches!(
            OptimizationConstraints::from_json(&json!({ "long_only": "yes" })),
            Err(RiskAnalyticsError::Configuration { .. })
        ));
    }

    #[test]
    fn test_from_json_null_is_default() {
        let c = OptimizationConstraints::from_json(&serde_json::Value::Null).unwrap();
        assert_eq!(c, OptimizationConstraints::default());
        assert!(c.sum_to_one);
    }

    #[test]
    fn test_serde_denies_unknown_fields() {
        let r: Result<OptimizationConstraints, _> =
            serde_json::from_value(json!({ "leverage": 2 }));
        assert!(r.is_err());
    }

    #[test]
    fn test_solver_config_validation() {
        let bad = SolverConfig {
            max_iterations: 0,
            tolerance: dec!(0.001),
        };
        assert!(matches!(
            bad.validate(),
            Err(RiskAnalyticsError::Configuration { .. })
        ));
        assert!(SolverConfig::default().validate().is_ok());
    }
}
