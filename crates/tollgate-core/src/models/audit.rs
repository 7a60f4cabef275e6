//! Audit ledger domain model.
//!
//! One record per committed privileged mutation, written atomically
//! with the mutation it describes. Records are never updated or
//! deleted by application code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of auditable privileged actions.
///
/// Callers must not invent free-text action types; extending this
/// enumeration is a reviewed schema change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditActionType {
    ManualPayment,
    SubscriptionOverride,
    ContentDeletion,
    RoleChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor_user_id: Uuid,
    pub actor_email: String,
    pub actor_display_name: String,
    pub action_type: AuditActionType,
    pub target_type: String,
    pub target_id: String,
    /// `None` for operations with no single tenant.
    pub affected_tenant_id: Option<Uuid>,
    /// By-value snapshot of the relevant fields before the mutation.
    pub state_before: serde_json::Value,
    /// By-value snapshot after the mutation.
    pub state_after: serde_json::Value,
    pub justification: String,
    pub caller_address: Option<String>,
    pub caller_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to append an audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditRecord {
    pub actor_user_id: Uuid,
    pub actor_email: String,
    pub actor_display_name: String,
    pub action_type: AuditActionType,
    pub target_type: String,
    pub target_id: String,
    pub affected_tenant_id: Option<Uuid>,
    pub state_before: serde_json::Value,
    pub state_after: serde_json::Value,
    pub justification: String,
    pub caller_address: Option<String>,
    pub caller_agent: Option<String>,
}

/// Filter for ledger reads. All fields are conjunctive; `None` means
/// no constraint.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor_user_id: Option<Uuid>,
    pub action_type: Option<AuditActionType>,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub affected_tenant_id: Option<Uuid>,
}
