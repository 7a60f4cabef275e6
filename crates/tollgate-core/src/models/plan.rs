//! Plan domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A billing plan and its resource limits.
///
/// Plans are immutable per version: a limit change is a new plan row,
/// never an in-place edit, so historical decisions stay explainable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    /// Human-readable name (e.g. `Free`, `Pro`), used verbatim in
    /// limit-denial messages.
    pub name: String,
    /// Cumulative cap on stored documents. Zero disallows the resource.
    pub max_documents: u64,
    /// Cumulative cap on ingested websites.
    pub max_websites: u64,
    /// Chat messages allowed per calendar month.
    pub monthly_chat_messages: u64,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlan {
    pub name: String,
    pub max_documents: u64,
    pub max_websites: u64,
    pub monthly_chat_messages: u64,
}
