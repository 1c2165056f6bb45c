//! Mean-variance and risk-parity portfolio construction.
//!
//! Both solvers are bounded-iteration routines whose iteration cap and
//! tolerance come from [`constraints::SolverConfig`].

pub mod constraints;
pub mod mean_variance;
pub mod risk_parity;
