//! Usage-limit enforcement on top of status evaluation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tollgate_core::error::{TollgateError, TollgateResult};
use tollgate_core::models::decision::{EntitlementDecision, Operation};
use tollgate_core::models::plan::Plan;
use tollgate_core::models::usage::{
    next_month_start, ChatUsage, ResourceKind, ResourceUsage, UsageSummary,
};
use tollgate_core::repository::{PlanRepository, SubscriptionRepository, UsageRepository};

use crate::config::EntitlementConfig;
use crate::evaluator::EntitlementEvaluator;

fn limit_for(plan: &Plan, resource: ResourceKind) -> u64 {
    match resource {
        ResourceKind::Documents => plan.max_documents,
        ResourceKind::Websites => plan.max_websites,
        ResourceKind::MonthlyChats => plan.monthly_chat_messages,
    }
}

/// Entitlement check service: status rules first, then per-resource
/// limit comparison.
///
/// Generic over repository implementations so this crate has no
/// dependency on the database crate.
pub struct UsageLimitEnforcer<S, P, U>
where
    S: SubscriptionRepository,
    P: PlanRepository,
    U: UsageRepository,
{
    subscription_repo: S,
    plan_repo: P,
    usage_repo: U,
    evaluator: EntitlementEvaluator,
}

impl<S, P, U> UsageLimitEnforcer<S, P, U>
where
    S: SubscriptionRepository,
    P: PlanRepository,
    U: UsageRepository,
{
    pub fn new(subscription_repo: S, plan_repo: P, usage_repo: U, config: EntitlementConfig) -> Self {
        Self {
            subscription_repo,
            plan_repo,
            usage_repo,
            evaluator: EntitlementEvaluator::new(config),
        }
    }

    /// Decides whether `tenant_id` may perform `operation` at `now`.
    ///
    /// A status deny is returned unchanged; limits are only consulted
    /// once the subscription itself allows. This pre-check is advisory
    /// under concurrency — [`record_usage`](Self::record_usage) is the
    /// enforcement point once the action executes.
    pub async fn check(
        &self,
        tenant_id: Uuid,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> TollgateResult<EntitlementDecision> {
        let subscription = match self.subscription_repo.get_by_tenant(tenant_id).await {
            Ok(sub) => Some(sub),
            Err(TollgateError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        let status_decision = self.evaluator.evaluate(subscription.as_ref(), now);
        if !status_decision.allowed {
            return Ok(status_decision);
        }

        let Some(resource) = operation.resource() else {
            return Ok(status_decision);
        };

        // The evaluator only allows when a subscription exists.
        let subscription = subscription.ok_or(TollgateError::TenantContext)?;

        let plan = match self.plan_repo.get_by_id(subscription.plan_id).await {
            Ok(plan) => plan,
            Err(TollgateError::NotFound { .. }) => {
                // Unknown plan means no limit information; denying is
                // safer than silently allowing.
                return Ok(EntitlementDecision::deny(
                    "Plan information is unavailable for this tenant",
                ));
            }
            Err(e) => return Err(e),
        };

        let limit = limit_for(&plan, resource);
        let period = resource.period_key(now);
        let used = self
            .usage_repo
            .get_count(tenant_id, resource, period.as_deref())
            .await?;

        if used < limit {
            Ok(EntitlementDecision::allow())
        } else {
            Ok(EntitlementDecision::deny(format!(
                "{} limit reached ({} {} allowed on {} plan)",
                resource.label(),
                limit,
                resource.unit(),
                plan.name,
            )))
        }
    }

    /// Consumes one unit of the operation's resource, atomically
    /// conditioned on the plan limit. Returns whether the increment
    /// was applied.
    ///
    /// Called once the gated action actually executes, not at
    /// check time.
    pub async fn record_usage(
        &self,
        tenant_id: Uuid,
        operation: Operation,
        now: DateTime<Utc>,
    ) -> TollgateResult<bool> {
        let Some(resource) = operation.resource() else {
            return Ok(true);
        };

        let subscription = self.subscription_repo.get_by_tenant(tenant_id).await?;
        let plan = self.plan_repo.get_by_id(subscription.plan_id).await?;
        let limit = limit_for(&plan, resource);
        let period = resource.period_key(now);

        self.usage_repo
            .increment_if_below(tenant_id, resource, period.as_deref(), limit)
            .await
    }

    /// Read-only used/limit/remaining aggregation for display.
    pub async fn usage_summary(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> TollgateResult<UsageSummary> {
        let subscription = self.subscription_repo.get_by_tenant(tenant_id).await?;
        let plan = self.plan_repo.get_by_id(subscription.plan_id).await?;

        let documents = self
            .usage_repo
            .get_count(tenant_id, ResourceKind::Documents, None)
            .await?;
        let websites = self
            .usage_repo
            .get_count(tenant_id, ResourceKind::Websites, None)
            .await?;
        let chat_period = ResourceKind::MonthlyChats.period_key(now);
        let chats = self
            .usage_repo
            .get_count(tenant_id, ResourceKind::MonthlyChats, chat_period.as_deref())
            .await?;

        let chat_limit = plan.monthly_chat_messages;
        Ok(UsageSummary {
            documents: ResourceUsage::new(documents, plan.max_documents),
            websites: ResourceUsage::new(websites, plan.max_websites),
            monthly_chats: ChatUsage {
                used: chats,
                limit: chat_limit,
                remaining: chat_limit.saturating_sub(chats),
                resets_at: next_month_start(now),
            },
        })
    }
}
