//! Subscription domain model.
//!
//! A subscription is the billing relationship between a tenant and a
//! plan. Its status drives every entitlement decision. Status
//! transitions are written only by the payment-processing collaborator
//! or by privileged manual overrides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Expired,
    Cancelled,
    Pending,
}

/// A tenant's subscription to a plan.
///
/// Invariant: `current_period_end` is always `Some` once the
/// subscription has left `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    /// End of the trial window; only meaningful while `Trialing`.
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub tenant_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

/// Fields that can be updated on an existing subscription.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSubscription {
    pub status: Option<SubscriptionStatus>,
    pub plan_id: Option<Uuid>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub trial_ends_at: Option<Option<DateTime<Utc>>>,
}
