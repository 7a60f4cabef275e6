//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! take a `tenant_id` parameter to enforce data isolation.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TollgateResult;
use crate::models::{
    audit::{AuditFilter, AuditRecord, CreateAuditRecord},
    payment::ManualPayment,
    plan::{CreatePlan, Plan},
    subscription::{CreateSubscription, Subscription, UpdateSubscription},
    usage::ResourceKind,
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Subscription & Plan
// ---------------------------------------------------------------------------

pub trait SubscriptionRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSubscription,
    ) -> impl Future<Output = TollgateResult<Subscription>> + Send;
    /// A tenant has at most one subscription.
    fn get_by_tenant(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = TollgateResult<Subscription>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        input: UpdateSubscription,
    ) -> impl Future<Output = TollgateResult<Subscription>> + Send;
}

pub trait PlanRepository: Send + Sync {
    fn create(&self, input: CreatePlan) -> impl Future<Output = TollgateResult<Plan>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TollgateResult<Plan>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = TollgateResult<PaginatedResult<Plan>>> + Send;
}

// ---------------------------------------------------------------------------
// Usage counters
// ---------------------------------------------------------------------------

pub trait UsageRepository: Send + Sync {
    /// Current count for `(tenant, resource, period)`; zero if the
    /// counter has never been touched.
    fn get_count(
        &self,
        tenant_id: Uuid,
        resource: ResourceKind,
        period: Option<&str>,
    ) -> impl Future<Output = TollgateResult<u64>> + Send;

    /// Unconditional increment, for resources counted after the fact.
    fn increment(
        &self,
        tenant_id: Uuid,
        resource: ResourceKind,
        period: Option<&str>,
    ) -> impl Future<Output = TollgateResult<u64>> + Send;

    /// Atomic conditional increment: adds one only if the resulting
    /// count stays within `limit`, returning whether it did.
    ///
    /// This is the authoritative enforcement point under concurrency;
    /// the evaluator's pre-check is a fast-reject optimization.
    fn increment_if_below(
        &self,
        tenant_id: Uuid,
        resource: ResourceKind,
        period: Option<&str>,
        limit: u64,
    ) -> impl Future<Output = TollgateResult<bool>> + Send;
}

// ---------------------------------------------------------------------------
// Audit ledger
// ---------------------------------------------------------------------------

/// Append-only ledger of privileged mutations. No update or delete is
/// exposed; removal, if ever needed, is an out-of-band operational act.
pub trait AuditRepository: Send + Sync {
    fn append(
        &self,
        input: CreateAuditRecord,
    ) -> impl Future<Output = TollgateResult<AuditRecord>> + Send;
    fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> impl Future<Output = TollgateResult<PaginatedResult<AuditRecord>>> + Send;
}

// ---------------------------------------------------------------------------
// Manual override commit
// ---------------------------------------------------------------------------

/// Everything the storage layer needs to commit a manual payment as
/// one atomic unit.
#[derive(Debug, Clone)]
pub struct CommitManualPayment {
    pub tenant_id: Uuid,
    pub subscription_id: Uuid,
    pub amount: u64,
    pub invoice_number: String,
    /// New status, if the override changes it.
    pub new_status: Option<crate::models::subscription::SubscriptionStatus>,
    /// New period end, if the override extends the subscription.
    pub new_period_end: Option<DateTime<Utc>>,
    /// `updated_at` of the subscription snapshot this commit was
    /// computed from. The commit is rejected with a conflict error if
    /// the subscription changed since, so a concurrent override can
    /// never be silently overwritten.
    pub expected_updated_at: DateTime<Utc>,
    pub audit: CreateAuditRecord,
}

/// What a successful atomic commit produced.
#[derive(Debug, Clone)]
pub struct CommittedOverride {
    pub payment: ManualPayment,
    pub subscription: Subscription,
    pub audit: AuditRecord,
}

pub trait OverrideRepository: Send + Sync {
    /// Allocates the next invoice sequence number for a UTC day.
    ///
    /// Monotonic per day; a later failed commit may leave a gap, which
    /// is acceptable.
    fn next_invoice_sequence(
        &self,
        day: &str,
    ) -> impl Future<Output = TollgateResult<u64>> + Send;

    /// Commits payment + subscription update + audit record in a
    /// single transaction; all three succeed or none do.
    fn commit_manual_payment(
        &self,
        input: CommitManualPayment,
    ) -> impl Future<Output = TollgateResult<CommittedOverride>> + Send;
}
