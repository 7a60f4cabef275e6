//! Integration tests for the manual payment override workflow:
//! privilege gating, validation, the atomic commit, and the audit
//! trail it must leave behind.

use chrono::{Duration, TimeZone, Utc};
use surrealdb::engine::local::Mem;
use surrealdb::Surreal;
use tollgate_core::error::TollgateError;
use tollgate_core::models::actor::{Capability, CapabilitySet, PrivilegedActor};
use tollgate_core::models::audit::{AuditActionType, AuditFilter};
use tollgate_core::models::plan::CreatePlan;
use tollgate_core::models::subscription::{CreateSubscription, SubscriptionStatus};
use tollgate_core::repository::{
    AuditRepository, Pagination, PlanRepository, SubscriptionRepository,
};
use tollgate_db::repository::{
    SurrealAuditRepository, SurrealOverrideRepository, SurrealPlanRepository,
    SurrealSubscriptionRepository,
};
use tollgate_entitlement::notify::NullNotifier;
use tollgate_entitlement::overrides::{ManualOverrideService, ManualPaymentRequest};
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tollgate_db::run_migrations(&db).await.unwrap();
    db
}

fn service(
    db: &Surreal<Db>,
) -> ManualOverrideService<
    SurrealSubscriptionRepository<Db>,
    SurrealOverrideRepository<Db>,
    NullNotifier,
> {
    ManualOverrideService::new(
        SurrealSubscriptionRepository::new(db.clone()),
        SurrealOverrideRepository::new(db.clone()),
        NullNotifier,
    )
}

fn operator() -> PrivilegedActor {
    PrivilegedActor {
        user_id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        email: "operator@example.com".into(),
        display_name: "Platform Operator".into(),
        capabilities: CapabilitySet::empty().with(Capability::CrossTenantOperator),
    }
}

fn request(tenant_id: Uuid) -> ManualPaymentRequest {
    ManualPaymentRequest {
        tenant_id,
        amount: 50_000,
        justification: "bank transfer received".into(),
        extension_days: Some(30),
        caller_address: Some("203.0.113.7".into()),
        caller_agent: Some("ops-console/1.0".into()),
    }
}

/// Past-due tenant with period end 2026-02-03T12:00:00Z on a Free
/// plan.
async fn seed_past_due(db: &Surreal<Db>) -> Uuid {
    let tenant_id = Uuid::new_v4();
    let plan = SurrealPlanRepository::new(db.clone())
        .create(CreatePlan {
            name: "Free".into(),
            max_documents: 5,
            max_websites: 2,
            monthly_chat_messages: 100,
        })
        .await
        .unwrap();
    let period_end = Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap();
    SurrealSubscriptionRepository::new(db.clone())
        .create(CreateSubscription {
            tenant_id,
            plan_id: plan.id,
            status: SubscriptionStatus::PastDue,
            current_period_start: Some(period_end - Duration::days(30)),
            current_period_end: Some(period_end),
            trial_ends_at: None,
        })
        .await
        .unwrap();
    tenant_id
}

#[tokio::test]
async fn manual_payment_with_extension_reactivates_past_due() {
    let db = setup().await;
    let tenant_id = seed_past_due(&db).await;
    let service = service(&db);
    let actor = operator();

    let now = Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap();
    let outcome = service
        .execute_at(&actor, request(tenant_id), now)
        .await
        .unwrap();

    // Extension is anchored at the later of period end and now.
    assert_eq!(outcome.subscription.status, SubscriptionStatus::Active);
    assert_eq!(
        outcome.subscription.current_period_end,
        Some(Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap())
    );

    assert_eq!(outcome.payment.amount, 50_000);
    assert!(
        outcome.payment.invoice_number.starts_with("INV-20260205-"),
        "unexpected invoice number {}",
        outcome.payment.invoice_number
    );
    assert_eq!(outcome.payment.invoice_number.len(), "INV-20260205-0001".len());

    // Exactly one audit record, with before/after snapshots.
    let audit_repo = SurrealAuditRepository::new(db.clone());
    let records = audit_repo
        .list(
            AuditFilter {
                affected_tenant_id: Some(tenant_id),
                action_type: Some(AuditActionType::ManualPayment),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(records.total, 1);
    let record = &records.items[0];
    assert_eq!(record.actor_user_id, actor.user_id);
    assert_eq!(record.justification, "bank transfer received");
    assert_eq!(record.state_before["status"], "PastDue");
    assert_eq!(record.state_after["status"], "Active");
    assert_ne!(record.state_before, record.state_after);
}

#[tokio::test]
async fn payment_without_extension_leaves_period_untouched() {
    let db = setup().await;
    let tenant_id = seed_past_due(&db).await;
    let service = service(&db);

    let now = Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap();
    let mut req = request(tenant_id);
    req.extension_days = None;

    let outcome = service.execute_at(&operator(), req, now).await.unwrap();
    assert_eq!(outcome.subscription.status, SubscriptionStatus::PastDue);
    assert_eq!(
        outcome.subscription.current_period_end,
        Some(Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn extension_from_active_keeps_status() {
    let db = setup().await;
    let tenant_id = Uuid::new_v4();
    let plan = SurrealPlanRepository::new(db.clone())
        .create(CreatePlan {
            name: "Pro".into(),
            max_documents: 100,
            max_websites: 10,
            monthly_chat_messages: 1000,
        })
        .await
        .unwrap();
    let now = Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap();
    let period_end = now + Duration::days(10);
    SurrealSubscriptionRepository::new(db.clone())
        .create(CreateSubscription {
            tenant_id,
            plan_id: plan.id,
            status: SubscriptionStatus::Active,
            current_period_start: Some(now - Duration::days(20)),
            current_period_end: Some(period_end),
            trial_ends_at: None,
        })
        .await
        .unwrap();

    let outcome = service(&db)
        .execute_at(&operator(), request(tenant_id), now)
        .await
        .unwrap();
    assert_eq!(outcome.subscription.status, SubscriptionStatus::Active);
    assert_eq!(
        outcome.subscription.current_period_end,
        Some(period_end + Duration::days(30))
    );
}

#[tokio::test]
async fn invoice_sequence_is_monotonic_per_day() {
    let db = setup().await;
    let tenant_id = seed_past_due(&db).await;
    let service = service(&db);
    let now = Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap();

    let mut req = request(tenant_id);
    req.extension_days = None;
    let first = service
        .execute_at(&operator(), req.clone(), now)
        .await
        .unwrap();
    let second = service.execute_at(&operator(), req, now).await.unwrap();

    assert_eq!(first.payment.invoice_number, "INV-20260205-0001");
    assert_eq!(second.payment.invoice_number, "INV-20260205-0002");
}

#[tokio::test]
async fn concurrent_extensions_are_not_lost() {
    let db = setup().await;
    let tenant_id = seed_past_due(&db).await;
    let now = Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap();

    let first_service = service(&db);
    let second_service = service(&db);
    let first_actor = operator();
    let second_actor = operator();
    let (first, second) = tokio::join!(
        first_service.execute_at(&first_actor, request(tenant_id), now),
        second_service.execute_at(&second_actor, request(tenant_id), now),
    );

    // Each successful override must extend from the state the other
    // left behind; a lost update would leave only one extension
    // applied while both calls report success.
    let successes = i64::from(first.is_ok()) + i64::from(second.is_ok());
    assert!(successes >= 1);

    let sub = SurrealSubscriptionRepository::new(db.clone())
        .get_by_tenant(tenant_id)
        .await
        .unwrap();
    let period_end = Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap();
    assert_eq!(
        sub.current_period_end,
        Some(period_end + Duration::days(30 * successes))
    );

    // One audit record per committed override, no more.
    let ledger = SurrealAuditRepository::new(db)
        .list(AuditFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(ledger.total, successes as u64);
}

#[tokio::test]
async fn non_operator_is_rejected_before_any_state_change() {
    let db = setup().await;
    let tenant_id = seed_past_due(&db).await;
    let service = service(&db);

    let mut actor = operator();
    actor.capabilities = CapabilitySet::empty().with(Capability::TenantAdmin);

    let err = service
        .execute_at(&actor, request(tenant_id), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, TollgateError::AuthorizationDenied { .. }));

    assert_audit_empty(&db).await;
}

#[tokio::test]
async fn zero_amount_is_rejected_without_audit() {
    let db = setup().await;
    let tenant_id = seed_past_due(&db).await;
    let service = service(&db);

    let mut req = request(tenant_id);
    req.amount = 0;
    let err = service
        .execute_at(&operator(), req, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, TollgateError::Validation { .. }));

    assert_audit_empty(&db).await;
}

#[tokio::test]
async fn blank_justification_is_rejected_without_audit() {
    let db = setup().await;
    let tenant_id = seed_past_due(&db).await;
    let service = service(&db);

    let mut req = request(tenant_id);
    req.justification = "   ".into();
    let err = service
        .execute_at(&operator(), req, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, TollgateError::Validation { .. }));

    assert_audit_empty(&db).await;
}

#[tokio::test]
async fn unknown_tenant_is_not_found_without_audit() {
    let db = setup().await;
    let service = service(&db);

    let err = service
        .execute_at(&operator(), request(Uuid::new_v4()), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, TollgateError::NotFound { .. }));

    assert_audit_empty(&db).await;
}

async fn assert_audit_empty(db: &Surreal<Db>) {
    let records = SurrealAuditRepository::new(db.clone())
        .list(AuditFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(records.total, 0, "no audit record may exist");
}
