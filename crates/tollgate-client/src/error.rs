//! Client error types.

use thiserror::Error;

/// A single transport attempt's failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("authority returned status {status}")]
    Status { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors surfaced by the client to its caller.
///
/// `check()` never surfaces authority unavailability — that is
/// converted into a fail-open decision. Reads that cannot be
/// fabricated (usage summaries) do surface it.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("entitlement authority unreachable: {last_error}")]
    AuthorityUnreachable { last_error: String },
}
