pub mod error;
pub mod math;
pub mod types;

#[cfg(feature = "attribution")]
pub mod attribution;

#[cfg(feature = "performance")]
pub mod performance;

#[cfg(feature = "optimization")]
pub mod optimization;

#[cfg(feature = "credit")]
pub mod credit;

#[cfg(feature = "regulatory")]
pub mod regulatory;

pub use error::RiskAnalyticsError;
pub use types::*;

/// Standard result type for all risk-analytics operations
pub type RiskAnalyticsResult<T> = Result<T, RiskAnalyticsError>;
