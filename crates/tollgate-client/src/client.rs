//! The resilient entitlement client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::time::{sleep, timeout, Instant};
use tracing::warn;
use uuid::Uuid;

use tollgate_core::models::decision::{EntitlementDecision, Operation};
use tollgate_core::models::usage::UsageSummary;

use crate::error::ClientError;
use crate::policy::RetryPolicy;
use crate::transport::DecisionTransport;

/// Reason string attached to fail-open decisions.
pub const FAIL_OPEN_REASON: &str = "entitlement_authority_unreachable";

/// Asks the authority whether a tenant may perform an operation,
/// without ever blocking the caller past the configured deadline.
///
/// Holds no locks across the round-trip; the only resource in flight
/// is the caller's own task, so cancelling the enclosing request
/// cancels the check.
pub struct EntitlementClient<T: DecisionTransport> {
    transport: T,
    policy: RetryPolicy,
    fail_open_count: Arc<AtomicU64>,
}

impl<T: DecisionTransport> EntitlementClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            fail_open_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Total fail-open occurrences since construction.
    ///
    /// Escalation hook: a consuming service can alert or trip a
    /// circuit breaker on this counter; the client itself only counts.
    pub fn fail_open_count(&self) -> u64 {
        self.fail_open_count.load(Ordering::Relaxed)
    }

    /// Checks whether `tenant_id` may perform `operation`.
    ///
    /// Any definitive decision from the authority — allow or deny —
    /// is returned as-is; a deny that arrived slowly is still a deny.
    /// Only the absence of a definitive answer within the budget
    /// fails open.
    pub async fn check(&self, tenant_id: Uuid, operation: Operation) -> EntitlementDecision {
        let deadline = Instant::now() + self.policy.total_deadline;
        let mut last_error = String::from("no attempts made");

        for attempt in 0..self.policy.max_attempts {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match timeout(remaining, self.transport.fetch_decision(tenant_id, operation)).await {
                Ok(Ok(decision)) => return decision,
                Ok(Err(err)) => {
                    last_error = err.to_string();
                }
                Err(_) => {
                    last_error = "attempt deadline exceeded".into();
                    // The budget is spent; backing off cannot help.
                    break;
                }
            }

            // Exponential backoff, clipped to the remaining budget.
            let backoff = self.policy.backoff_for(attempt);
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(backoff.min(remaining)).await;
        }

        self.fail_open(tenant_id, operation, &last_error)
    }

    /// Fetches the tenant's usage summary under the same deadline and
    /// retry policy.
    ///
    /// No fail-open here: a summary cannot be fabricated, so
    /// exhaustion surfaces as [`ClientError::AuthorityUnreachable`].
    pub async fn usage_summary(&self, tenant_id: Uuid) -> Result<UsageSummary, ClientError> {
        let deadline = Instant::now() + self.policy.total_deadline;
        let mut last_error = String::from("no attempts made");

        for attempt in 0..self.policy.max_attempts {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match timeout(remaining, self.transport.fetch_usage_summary(tenant_id)).await {
                Ok(Ok(summary)) => return Ok(summary),
                Ok(Err(err)) => {
                    last_error = err.to_string();
                }
                Err(_) => {
                    last_error = "attempt deadline exceeded".into();
                    break;
                }
            }

            let backoff = self.policy.backoff_for(attempt);
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(backoff.min(remaining)).await;
        }

        Err(ClientError::AuthorityUnreachable { last_error })
    }

    fn fail_open(
        &self,
        tenant_id: Uuid,
        operation: Operation,
        last_error: &str,
    ) -> EntitlementDecision {
        self.fail_open_count.fetch_add(1, Ordering::Relaxed);
        warn!(
            %tenant_id,
            operation = operation.as_str(),
            last_error,
            "entitlement authority unreachable; failing open"
        );
        EntitlementDecision {
            allowed: true,
            reason: Some(FAIL_OPEN_REASON.to_string()),
        }
    }
}
