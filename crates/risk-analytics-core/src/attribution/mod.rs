//! Return decomposition and performance attribution.

pub mod brinson;
pub mod fixed_income;
pub mod returns;
