//! Unit tests for subscription-status evaluation.
//!
//! The evaluator is pure: every case is exercised with an explicit
//! snapshot and instant, no storage or clock involved.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tollgate_entitlement::config::EntitlementConfig;
use tollgate_entitlement::evaluator::EntitlementEvaluator;
use tollgate_core::models::subscription::{Subscription, SubscriptionStatus};
use uuid::Uuid;

fn subscription(status: SubscriptionStatus) -> Subscription {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    Subscription {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        plan_id: Uuid::new_v4(),
        status,
        current_period_start: Some(now),
        current_period_end: Some(now + Duration::days(30)),
        trial_ends_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

#[test]
fn missing_subscription_denies() {
    let evaluator = EntitlementEvaluator::default();
    let decision = evaluator.evaluate(None, Utc::now());
    assert!(!decision.allowed);
    assert_eq!(
        decision.reason.as_deref(),
        Some("No subscription found for this tenant")
    );
}

#[test]
fn active_always_allows() {
    let evaluator = EntitlementEvaluator::default();
    let sub = subscription(SubscriptionStatus::Active);
    // Even far past the period end: status rules do not look at it.
    let decision = evaluator.evaluate(Some(&sub), at(2030, 1, 1, 0, 0, 0));
    assert!(decision.allowed);
    assert!(decision.reason.is_none());
}

#[test]
fn trialing_allows_strictly_before_trial_end() {
    let evaluator = EntitlementEvaluator::default();
    let mut sub = subscription(SubscriptionStatus::Trialing);
    let trial_end = at(2026, 1, 15, 12, 0, 0);
    sub.trial_ends_at = Some(trial_end);

    assert!(
        evaluator
            .evaluate(Some(&sub), trial_end - Duration::seconds(1))
            .allowed
    );
    // `now == trial_ends_at` is already expired.
    let boundary = evaluator.evaluate(Some(&sub), trial_end);
    assert!(!boundary.allowed);
    assert_eq!(boundary.reason.as_deref(), Some("Trial period has expired"));
}

#[test]
fn trialing_without_trial_end_denies() {
    let evaluator = EntitlementEvaluator::default();
    let sub = subscription(SubscriptionStatus::Trialing);
    let decision = evaluator.evaluate(Some(&sub), Utc::now());
    assert!(!decision.allowed);
    assert_eq!(decision.reason.as_deref(), Some("Trial period has expired"));
}

#[test]
fn past_due_grace_boundary() {
    let evaluator = EntitlementEvaluator::new(EntitlementConfig {
        grace_period_days: 3,
    });
    let mut sub = subscription(SubscriptionStatus::PastDue);
    let period_end = at(2026, 2, 3, 12, 0, 0);
    sub.current_period_end = Some(period_end);

    let deadline = period_end + Duration::days(3);
    assert!(
        evaluator
            .evaluate(Some(&sub), deadline - Duration::seconds(1))
            .allowed
    );
    // Inclusive deadline.
    assert!(evaluator.evaluate(Some(&sub), deadline).allowed);

    let expired = evaluator.evaluate(Some(&sub), deadline + Duration::seconds(1));
    assert!(!expired.allowed);
    assert_eq!(
        expired.reason.as_deref(),
        Some("Subscription is past due and the 3-day grace period has expired")
    );
}

#[test]
fn grace_period_is_configurable() {
    let mut sub = subscription(SubscriptionStatus::PastDue);
    let period_end = at(2026, 2, 3, 12, 0, 0);
    sub.current_period_end = Some(period_end);
    let probe = period_end + Duration::days(5);

    let short = EntitlementEvaluator::new(EntitlementConfig {
        grace_period_days: 3,
    });
    let long = EntitlementEvaluator::new(EntitlementConfig {
        grace_period_days: 10,
    });

    // Two configurations coexist; no hidden global state.
    assert!(!short.evaluate(Some(&sub), probe).allowed);
    assert!(long.evaluate(Some(&sub), probe).allowed);
    assert_eq!(
        short.evaluate(Some(&sub), probe).reason.as_deref(),
        Some("Subscription is past due and the 3-day grace period has expired")
    );
}

#[test]
fn past_due_without_period_end_denies() {
    let evaluator = EntitlementEvaluator::default();
    let mut sub = subscription(SubscriptionStatus::PastDue);
    sub.current_period_end = None;
    assert!(!evaluator.evaluate(Some(&sub), Utc::now()).allowed);
}

#[test]
fn terminal_statuses_always_deny() {
    let evaluator = EntitlementEvaluator::default();
    let cases = [
        (SubscriptionStatus::Expired, "Subscription has expired"),
        (SubscriptionStatus::Cancelled, "Subscription has been cancelled"),
        (SubscriptionStatus::Pending, "Subscription has not been activated"),
    ];
    for (status, reason) in cases {
        let sub = subscription(status);
        let decision = evaluator.evaluate(Some(&sub), Utc::now());
        assert!(!decision.allowed, "{status:?} must deny");
        assert_eq!(decision.reason.as_deref(), Some(reason));
    }
}

#[test]
fn evaluation_is_deterministic() {
    let evaluator = EntitlementEvaluator::default();
    let sub = subscription(SubscriptionStatus::PastDue);
    let probe = at(2026, 2, 1, 0, 0, 0);
    let first = evaluator.evaluate(Some(&sub), probe);
    let second = evaluator.evaluate(Some(&sub), probe);
    assert_eq!(first, second);
}
