//! Integration tests for Plan and Subscription repository
//! implementations using in-memory SurrealDB.

use chrono::{Duration, TimeZone, Utc};
use surrealdb::engine::local::Mem;
use surrealdb::Surreal;
use tollgate_core::error::TollgateError;
use tollgate_core::models::plan::CreatePlan;
use tollgate_core::models::subscription::{
    CreateSubscription, SubscriptionStatus, UpdateSubscription,
};
use tollgate_core::repository::{Pagination, PlanRepository, SubscriptionRepository};
use tollgate_db::repository::{SurrealPlanRepository, SurrealSubscriptionRepository};
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tollgate_db::run_migrations(&db).await.unwrap();
    db
}

// -----------------------------------------------------------------------
// Plan tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_plan() {
    let db = setup().await;
    let repo = SurrealPlanRepository::new(db);

    let plan = repo
        .create(CreatePlan {
            name: "Free".into(),
            max_documents: 5,
            max_websites: 2,
            monthly_chat_messages: 100,
        })
        .await
        .unwrap();

    assert_eq!(plan.name, "Free");
    assert_eq!(plan.max_documents, 5);

    let fetched = repo.get_by_id(plan.id).await.unwrap();
    assert_eq!(fetched.id, plan.id);
    assert_eq!(fetched.monthly_chat_messages, 100);
}

#[tokio::test]
async fn get_unknown_plan_is_not_found() {
    let db = setup().await;
    let repo = SurrealPlanRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TollgateError::NotFound { .. }));
}

#[tokio::test]
async fn list_plans_paginates() {
    let db = setup().await;
    let repo = SurrealPlanRepository::new(db);

    for name in ["Free", "Pro", "Enterprise"] {
        repo.create(CreatePlan {
            name: name.into(),
            max_documents: 5,
            max_websites: 2,
            monthly_chat_messages: 100,
        })
        .await
        .unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);

    let rest = repo
        .list(Pagination {
            offset: 2,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
}

// -----------------------------------------------------------------------
// Subscription tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_subscription_by_tenant() {
    let db = setup().await;
    let repo = SurrealSubscriptionRepository::new(db);
    let tenant_id = Uuid::new_v4();
    let period_end = Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap();

    let sub = repo
        .create(CreateSubscription {
            tenant_id,
            plan_id: Uuid::new_v4(),
            status: SubscriptionStatus::Active,
            current_period_start: Some(period_end - Duration::days(30)),
            current_period_end: Some(period_end),
            trial_ends_at: None,
        })
        .await
        .unwrap();

    let fetched = repo.get_by_tenant(tenant_id).await.unwrap();
    assert_eq!(fetched.id, sub.id);
    assert_eq!(fetched.status, SubscriptionStatus::Active);
    assert_eq!(fetched.current_period_end, Some(period_end));
}

#[tokio::test]
async fn tenant_without_subscription_is_not_found() {
    let db = setup().await;
    let repo = SurrealSubscriptionRepository::new(db);

    let err = repo.get_by_tenant(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TollgateError::NotFound { .. }));
}

#[tokio::test]
async fn update_subscription_status_and_period() {
    let db = setup().await;
    let repo = SurrealSubscriptionRepository::new(db);
    let tenant_id = Uuid::new_v4();
    let period_end = Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap();

    repo.create(CreateSubscription {
        tenant_id,
        plan_id: Uuid::new_v4(),
        status: SubscriptionStatus::PastDue,
        current_period_start: Some(period_end - Duration::days(30)),
        current_period_end: Some(period_end),
        trial_ends_at: None,
    })
    .await
    .unwrap();

    let new_end = period_end + Duration::days(30);
    let updated = repo
        .update(
            tenant_id,
            UpdateSubscription {
                status: Some(SubscriptionStatus::Active),
                current_period_end: Some(new_end),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, SubscriptionStatus::Active);
    assert_eq!(updated.current_period_end, Some(new_end));
    // Untouched fields survive a partial update.
    assert_eq!(
        updated.current_period_start,
        Some(period_end - Duration::days(30))
    );
}

#[tokio::test]
async fn one_subscription_per_tenant_is_enforced() {
    let db = setup().await;
    let repo = SurrealSubscriptionRepository::new(db);
    let tenant_id = Uuid::new_v4();

    let input = CreateSubscription {
        tenant_id,
        plan_id: Uuid::new_v4(),
        status: SubscriptionStatus::Pending,
        current_period_start: None,
        current_period_end: None,
        trial_ends_at: None,
    };
    repo.create(input.clone()).await.unwrap();
    // The unique index rejects a second subscription for the tenant.
    assert!(repo.create(input).await.is_err());
}
