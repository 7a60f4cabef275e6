//! Database-specific error types and conversions.

use tollgate_core::error::TollgateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Concurrent modification of {entity}")]
    Conflict { entity: String },
}

impl From<DbError> for TollgateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TollgateError::NotFound { entity, id },
            DbError::Conflict { entity } => TollgateError::Conflict { entity },
            other => TollgateError::Database(other.to_string()),
        }
    }
}
