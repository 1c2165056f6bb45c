//! Credit risk parameters (EAD, LGD), loss and capital measures,
//! concentration, and rating migration.
//!
//! Transition matrices and LGD tables are reference data: they are built
//! once through [`reference::ReferenceData`] and passed in by the caller.

pub mod capital;
pub mod concentration;
pub mod exposure;
pub mod lgd;
pub mod migration;
pub mod reference;
