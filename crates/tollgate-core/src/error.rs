//! Error types for the Tollgate system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TollgateError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Entitlement denied: {reason}")]
    EntitlementDenied { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Concurrent modification of {entity}")]
    Conflict { entity: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Audit write failed: {0}")]
    AuditWrite(String),

    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TollgateResult<T> = Result<T, TollgateError>;
