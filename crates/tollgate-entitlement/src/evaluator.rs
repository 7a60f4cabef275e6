//! Subscription-status entitlement evaluation.
//!
//! Pure and deterministic given `(snapshot, now)`: no clock reads, no
//! storage, no network. Callers supply both the subscription snapshot
//! and the instant to evaluate at.

use chrono::{DateTime, Duration, Utc};
use tollgate_core::models::decision::EntitlementDecision;
use tollgate_core::models::subscription::{Subscription, SubscriptionStatus};

use crate::config::EntitlementConfig;

/// Turns a subscription snapshot into an allow/deny decision.
#[derive(Debug, Clone)]
pub struct EntitlementEvaluator {
    config: EntitlementConfig,
}

impl EntitlementEvaluator {
    pub fn new(config: EntitlementConfig) -> Self {
        Self { config }
    }

    pub fn grace_period_days(&self) -> i64 {
        self.config.grace_period_days
    }

    /// Evaluates the status rules in order. Status always takes
    /// precedence over usage limits, which are layered on top by the
    /// enforcer.
    pub fn evaluate(
        &self,
        subscription: Option<&Subscription>,
        now: DateTime<Utc>,
    ) -> EntitlementDecision {
        let Some(sub) = subscription else {
            return EntitlementDecision::deny("No subscription found for this tenant");
        };

        match sub.status {
            SubscriptionStatus::Trialing => match sub.trial_ends_at {
                Some(trial_end) if now < trial_end => EntitlementDecision::allow(),
                _ => EntitlementDecision::deny("Trial period has expired"),
            },
            SubscriptionStatus::Active => EntitlementDecision::allow(),
            SubscriptionStatus::PastDue => self.evaluate_past_due(sub, now),
            SubscriptionStatus::Expired => EntitlementDecision::deny("Subscription has expired"),
            SubscriptionStatus::Cancelled => {
                EntitlementDecision::deny("Subscription has been cancelled")
            }
            SubscriptionStatus::Pending => {
                EntitlementDecision::deny("Subscription has not been activated")
            }
        }
    }

    fn evaluate_past_due(&self, sub: &Subscription, now: DateTime<Utc>) -> EntitlementDecision {
        let days = self.config.grace_period_days;
        // A past-due subscription without a period end violates the
        // data invariant; deny rather than guess a deadline.
        let Some(period_end) = sub.current_period_end else {
            return EntitlementDecision::deny(format!(
                "Subscription is past due and the {days}-day grace period has expired"
            ));
        };

        let grace_deadline = period_end + Duration::days(days);
        if now <= grace_deadline {
            EntitlementDecision::allow()
        } else {
            EntitlementDecision::deny(format!(
                "Subscription is past due and the {days}-day grace period has expired"
            ))
        }
    }
}

impl Default for EntitlementEvaluator {
    fn default() -> Self {
        Self::new(EntitlementConfig::default())
    }
}
