pub mod attribution;
pub mod credit;
pub mod optimization;
pub mod performance;
pub mod regulatory;

use risk_analytics_core::with_metadata;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

pub type CommandResult = Result<Value, Box<dyn std::error::Error>>;

/// Wrap a finished computation in the output envelope, stamping the time
/// elapsed since `started`.
pub fn envelope<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    started: Instant,
    result: T,
) -> CommandResult {
    let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    tracing::debug!(elapsed_us, methodology, "computation finished");
    let output = with_metadata(methodology, assumptions, warnings, elapsed_us, result);
    Ok(serde_json::to_value(output)?)
}
