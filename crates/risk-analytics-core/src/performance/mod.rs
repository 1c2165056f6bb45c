//! Risk-adjusted return ratios and benchmark-relative statistics.

pub mod benchmark;
pub mod ratios;
pub mod summary;
