//! Domain models for Tollgate.
//!
//! These are the core types shared across all crates.

pub mod actor;
pub mod audit;
pub mod decision;
pub mod payment;
pub mod plan;
pub mod subscription;
pub mod usage;
