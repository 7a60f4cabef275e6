//! Entitlement error types.

use thiserror::Error;
use tollgate_core::error::TollgateError;

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("{reason}")]
    PrivilegeDenied { reason: String },

    #[error("audit write failed: {0}")]
    AuditWrite(String),
}

impl From<EntitlementError> for TollgateError {
    fn from(err: EntitlementError) -> Self {
        match err {
            EntitlementError::Validation { message } => TollgateError::Validation { message },
            EntitlementError::PrivilegeDenied { reason } => {
                TollgateError::AuthorizationDenied { reason }
            }
            EntitlementError::AuditWrite(msg) => TollgateError::AuditWrite(msg),
        }
    }
}
