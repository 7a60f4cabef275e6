//! Manual payment and subscription extension workflow.
//!
//! The reference orchestration for privileged mutations: privilege
//! gate, validation, by-value before/after snapshots, one atomic
//! commit of payment + subscription update + audit record, then a
//! best-effort notification.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use tollgate_core::error::{TollgateError, TollgateResult};
use tollgate_core::models::actor::PrivilegedActor;
use tollgate_core::models::audit::{AuditActionType, AuditRecord, CreateAuditRecord};
use tollgate_core::models::payment::ManualPayment;
use tollgate_core::models::subscription::{Subscription, SubscriptionStatus};
use tollgate_core::repository::{
    CommitManualPayment, CommittedOverride, OverrideRepository, SubscriptionRepository,
};

use crate::error::EntitlementError;
use crate::gate::PrivilegeGate;
use crate::notify::Notifier;

/// How many times a commit rejected for a stale snapshot is re-read
/// and recomputed before the conflict surfaces to the caller.
const COMMIT_ATTEMPTS: u32 = 3;

/// A cross-tenant operator's request to record a manual payment.
#[derive(Debug, Clone)]
pub struct ManualPaymentRequest {
    pub tenant_id: Uuid,
    /// Amount in the smallest currency unit; must be positive.
    pub amount: u64,
    /// Free-text reason; required for the audit trail.
    pub justification: String,
    /// Days to extend the subscription by, if any.
    pub extension_days: Option<i64>,
    pub caller_address: Option<String>,
    pub caller_agent: Option<String>,
}

/// What the committed workflow produced.
#[derive(Debug, Clone)]
pub struct ManualPaymentOutcome {
    pub payment: ManualPayment,
    pub subscription: Subscription,
    pub audit: AuditRecord,
}

/// Orchestrates the manual payment workflow.
///
/// Generic over repository implementations; the notifier must be
/// cloneable so delivery can be spawned off the request task.
pub struct ManualOverrideService<S, O, N>
where
    S: SubscriptionRepository,
    O: OverrideRepository,
    N: Notifier + Clone + 'static,
{
    subscription_repo: S,
    override_repo: O,
    notifier: N,
}

impl<S, O, N> ManualOverrideService<S, O, N>
where
    S: SubscriptionRepository,
    O: OverrideRepository,
    N: Notifier + Clone + 'static,
{
    pub fn new(subscription_repo: S, override_repo: O, notifier: N) -> Self {
        Self {
            subscription_repo,
            override_repo,
            notifier,
        }
    }

    /// Records a manual payment at the current instant.
    pub async fn execute(
        &self,
        actor: &PrivilegedActor,
        request: ManualPaymentRequest,
    ) -> TollgateResult<ManualPaymentOutcome> {
        self.execute_at(actor, request, Utc::now()).await
    }

    /// Records a manual payment as of `now`.
    ///
    /// Validation failures reject before any state is entered and
    /// produce no audit record; once the commit succeeds the outcome
    /// is terminal regardless of notification delivery.
    ///
    /// Concurrent overrides of the same subscription are serialized:
    /// the commit carries the snapshot's `updated_at`, and a stale
    /// snapshot is re-read and recomputed rather than allowed to
    /// overwrite the winner.
    pub async fn execute_at(
        &self,
        actor: &PrivilegedActor,
        request: ManualPaymentRequest,
        now: DateTime<Utc>,
    ) -> TollgateResult<ManualPaymentOutcome> {
        PrivilegeGate::require_cross_tenant_operator(actor)?;

        if request.amount == 0 {
            return Err(EntitlementError::Validation {
                message: "payment amount must be positive".into(),
            }
            .into());
        }
        if request.justification.trim().is_empty() {
            return Err(EntitlementError::Validation {
                message: "justification is required".into(),
            }
            .into());
        }

        let mut attempt = 0;
        let committed = loop {
            match self.commit_once(actor, &request, now).await {
                Ok(committed) => break committed,
                Err(TollgateError::Conflict { .. }) if attempt + 1 < COMMIT_ATTEMPTS => {
                    attempt += 1;
                    warn!(
                        tenant_id = %request.tenant_id,
                        attempt,
                        "subscription changed under manual payment; recomputing"
                    );
                }
                Err(e) => return Err(e),
            }
        };

        // Best-effort notification; never unwinds the commit.
        let notifier = self.notifier.clone();
        let tenant_id = request.tenant_id;
        let amount = request.amount;
        let invoice = committed.payment.invoice_number.clone();
        tokio::spawn(async move {
            if let Err(err) = notifier
                .manual_payment_recorded(tenant_id, invoice, amount)
                .await
            {
                warn!(%tenant_id, error = %err, "manual payment notification failed");
            }
        });

        Ok(ManualPaymentOutcome {
            payment: committed.payment,
            subscription: committed.subscription,
            audit: committed.audit,
        })
    }

    /// One read-compute-commit pass over the subscription.
    async fn commit_once(
        &self,
        actor: &PrivilegedActor,
        request: &ManualPaymentRequest,
        now: DateTime<Utc>,
    ) -> TollgateResult<CommittedOverride> {
        // NotFound propagates as-is: an unknown tenant is a client
        // error, not an audited mutation.
        let subscription = self
            .subscription_repo
            .get_by_tenant(request.tenant_id)
            .await?;

        // Snapshot by value before any mutation.
        let state_before = json!({
            "status": subscription.status,
            "current_period_end": subscription.current_period_end,
        });

        let day = now.format("%Y%m%d").to_string();
        let sequence = self.override_repo.next_invoice_sequence(&day).await?;
        let invoice_number = format!("INV-{day}-{sequence:04}");

        let (new_status, new_period_end) = match request.extension_days {
            Some(days) => {
                let base = subscription
                    .current_period_end
                    .map_or(now, |end| end.max(now));
                let new_end = base + Duration::days(days);
                let new_status = match subscription.status {
                    SubscriptionStatus::PastDue | SubscriptionStatus::Expired => {
                        Some(SubscriptionStatus::Active)
                    }
                    _ => None,
                };
                (new_status, Some(new_end))
            }
            None => (None, None),
        };

        let state_after = json!({
            "status": new_status.unwrap_or(subscription.status),
            "current_period_end": new_period_end.or(subscription.current_period_end),
        });

        let audit = CreateAuditRecord {
            actor_user_id: actor.user_id,
            actor_email: actor.email.clone(),
            actor_display_name: actor.display_name.clone(),
            action_type: AuditActionType::ManualPayment,
            target_type: "subscription".into(),
            target_id: subscription.id.to_string(),
            affected_tenant_id: Some(request.tenant_id),
            state_before,
            state_after,
            justification: request.justification.clone(),
            caller_address: request.caller_address.clone(),
            caller_agent: request.caller_agent.clone(),
        };

        self.override_repo
            .commit_manual_payment(CommitManualPayment {
                tenant_id: request.tenant_id,
                subscription_id: subscription.id,
                amount: request.amount,
                invoice_number,
                new_status,
                new_period_end,
                expected_updated_at: subscription.updated_at,
                audit,
            })
            .await
    }
}
