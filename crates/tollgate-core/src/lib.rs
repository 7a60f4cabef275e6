//! Tollgate Core — domain models, repository trait definitions, and
//! shared error types for the entitlement subsystem.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{TollgateError, TollgateResult};
