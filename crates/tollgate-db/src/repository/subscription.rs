//! SurrealDB implementation of [`SubscriptionRepository`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use tollgate_core::error::TollgateResult;
use tollgate_core::models::subscription::{
    CreateSubscription, Subscription, SubscriptionStatus, UpdateSubscription,
};
use tollgate_core::repository::SubscriptionRepository;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct SubscriptionRow {
    tenant_id: String,
    plan_id: String,
    status: String,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    trial_ends_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionRowWithId {
    record_id: String,
    tenant_id: String,
    plan_id: String,
    status: String,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    trial_ends_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_status(s: &str) -> Result<SubscriptionStatus, DbError> {
    match s {
        "Active" => Ok(SubscriptionStatus::Active),
        "Trialing" => Ok(SubscriptionStatus::Trialing),
        "PastDue" => Ok(SubscriptionStatus::PastDue),
        "Expired" => Ok(SubscriptionStatus::Expired),
        "Cancelled" => Ok(SubscriptionStatus::Cancelled),
        "Pending" => Ok(SubscriptionStatus::Pending),
        other => Err(DbError::Migration(format!(
            "unknown subscription status: {other}"
        ))),
    }
}

pub(crate) fn status_to_str(s: SubscriptionStatus) -> &'static str {
    match s {
        SubscriptionStatus::Active => "Active",
        SubscriptionStatus::Trialing => "Trialing",
        SubscriptionStatus::PastDue => "PastDue",
        SubscriptionStatus::Expired => "Expired",
        SubscriptionStatus::Cancelled => "Cancelled",
        SubscriptionStatus::Pending => "Pending",
    }
}

fn row_to_subscription(row: SubscriptionRow, id: Uuid) -> Result<Subscription, DbError> {
    let tenant_id = Uuid::parse_str(&row.tenant_id)
        .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
    let plan_id = Uuid::parse_str(&row.plan_id)
        .map_err(|e| DbError::Migration(format!("invalid plan UUID: {e}")))?;
    Ok(Subscription {
        id,
        tenant_id,
        plan_id,
        status: parse_status(&row.status)?,
        current_period_start: row.current_period_start,
        current_period_end: row.current_period_end,
        trial_ends_at: row.trial_ends_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl SubscriptionRowWithId {
    pub(crate) fn try_into_subscription(self) -> Result<Subscription, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
        let plan_id = Uuid::parse_str(&self.plan_id)
            .map_err(|e| DbError::Migration(format!("invalid plan UUID: {e}")))?;
        Ok(Subscription {
            id,
            tenant_id,
            plan_id,
            status: parse_status(&self.status)?,
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
            trial_ends_at: self.trial_ends_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Subscription repository.
#[derive(Clone)]
pub struct SurrealSubscriptionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubscriptionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SubscriptionRepository for SurrealSubscriptionRepository<C> {
    async fn create(&self, input: CreateSubscription) -> TollgateResult<Subscription> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('subscription', $id) SET \
                 tenant_id = $tenant_id, \
                 plan_id = $plan_id, \
                 status = $status, \
                 current_period_start = $current_period_start, \
                 current_period_end = $current_period_end, \
                 trial_ends_at = $trial_ends_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("plan_id", input.plan_id.to_string()))
            .bind(("status", status_to_str(input.status)))
            .bind((
                "current_period_start",
                input.current_period_start.map(Datetime::from),
            ))
            .bind((
                "current_period_end",
                input.current_period_end.map(Datetime::from),
            ))
            .bind(("trial_ends_at", input.trial_ends_at.map(Datetime::from)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<SubscriptionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscription".into(),
            id: id_str,
        })?;

        row_to_subscription(row, id).map_err(Into::into)
    }

    async fn get_by_tenant(&self, tenant_id: Uuid) -> TollgateResult<Subscription> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubscriptionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscription".into(),
            id: format!("tenant_id={tenant_id}"),
        })?;

        row.try_into_subscription().map_err(Into::into)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        input: UpdateSubscription,
    ) -> TollgateResult<Subscription> {
        let mut sets = vec!["updated_at = time::now()".to_string()];
        if input.status.is_some() {
            sets.push("status = $status".into());
        }
        if input.plan_id.is_some() {
            sets.push("plan_id = $plan_id".into());
        }
        if input.current_period_start.is_some() {
            sets.push("current_period_start = $current_period_start".into());
        }
        if input.current_period_end.is_some() {
            sets.push("current_period_end = $current_period_end".into());
        }
        if input.trial_ends_at.is_some() {
            sets.push("trial_ends_at = $trial_ends_at".into());
        }

        let sql = format!(
            "UPDATE subscription SET {} WHERE tenant_id = $tenant_id; \
             SELECT meta::id(id) AS record_id, * FROM subscription \
             WHERE tenant_id = $tenant_id",
            sets.join(", "),
        );

        let mut query = self
            .db
            .query(sql)
            .bind(("tenant_id", tenant_id.to_string()));
        if let Some(status) = input.status {
            query = query.bind(("status", status_to_str(status)));
        }
        if let Some(plan_id) = input.plan_id {
            query = query.bind(("plan_id", plan_id.to_string()));
        }
        if let Some(start) = input.current_period_start {
            query = query.bind(("current_period_start", Datetime::from(start)));
        }
        if let Some(end) = input.current_period_end {
            query = query.bind(("current_period_end", Datetime::from(end)));
        }
        if let Some(trial) = input.trial_ends_at {
            query = query.bind(("trial_ends_at", trial.map(Datetime::from)));
        }

        let result = query.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<SubscriptionRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "subscription".into(),
            id: format!("tenant_id={tenant_id}"),
        })?;

        row.try_into_subscription().map_err(Into::into)
    }
}
