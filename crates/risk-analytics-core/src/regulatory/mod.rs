//! Liquidity coverage, order-book market impact, stressed capital ratios
//! and credit-loss allowance.

pub mod allowance;
pub mod liquidity;
pub mod market_impact;
pub mod stress;
