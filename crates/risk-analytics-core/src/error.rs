use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskAnalyticsError {
    #[error("Invalid input: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Structural mismatch: {field}: {reason}")]
    Structural { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Not found: {kind} '{key}'")]
    NotFound { kind: String, key: String },

    #[error("Infeasible problem: {0}")]
    Infeasible(String),

    #[error(
        "Convergence failure: {function} did not converge after {iterations} iterations \
         (delta: {last_delta})"
    )]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Insufficient liquidity: order size {requested} exceeds available depth {available}")]
    InsufficientLiquidity {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Configuration error: {key}: {reason}")]
    Configuration { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RiskAnalyticsError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RiskAnalyticsError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn structural(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RiskAnalyticsError::Structural {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn division(context: impl Into<String>) -> Self {
        RiskAnalyticsError::DivisionByZero {
            context: context.into(),
        }
    }

    pub(crate) fn not_found(kind: impl Into<String>, key: impl Into<String>) -> Self {
        RiskAnalyticsError::NotFound {
            kind: kind.into(),
            key: key.into(),
        }
    }
}

impl From<serde_json::Error> for RiskAnalyticsError {
    fn from(e: serde_json::Error) -> Self {
        RiskAnalyticsError::Serialization(e.to_string())
    }
}
