//! SurrealDB implementation of [`UsageRepository`].
//!
//! Counter rows use deterministic record ids
//! (`<tenant>:<resource>:<period>`) so an UPSERT can never create a
//! duplicate counter and the conditional increment stays a single
//! record-level statement.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tollgate_core::error::TollgateResult;
use tollgate_core::models::usage::ResourceKind;
use tollgate_core::repository::UsageRepository;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn resource_to_str(r: ResourceKind) -> &'static str {
    match r {
        ResourceKind::Documents => "Documents",
        ResourceKind::Websites => "Websites",
        ResourceKind::MonthlyChats => "MonthlyChats",
    }
}

fn counter_key(tenant_id: Uuid, resource: ResourceKind, period: Option<&str>) -> String {
    format!(
        "{}:{}:{}",
        tenant_id,
        resource_to_str(resource),
        period.unwrap_or("total"),
    )
}

#[derive(Debug, Deserialize)]
struct CountField {
    count: u64,
}

/// SurrealDB implementation of the Usage repository.
#[derive(Clone)]
pub struct SurrealUsageRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUsageRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Idempotently creates the counter row at zero.
    async fn ensure_counter(
        &self,
        tenant_id: Uuid,
        resource: ResourceKind,
        period: Option<&str>,
    ) -> Result<String, DbError> {
        let key = counter_key(tenant_id, resource, period);
        self.db
            .query(
                "UPSERT type::thing('usage_counter', $key) SET \
                 tenant_id = $tenant_id, \
                 resource = $resource, \
                 period = $period",
            )
            .bind(("key", key.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("resource", resource_to_str(resource)))
            .bind(("period", period.map(str::to_string)))
            .await?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
        Ok(key)
    }
}

impl<C: Connection> UsageRepository for SurrealUsageRepository<C> {
    async fn get_count(
        &self,
        tenant_id: Uuid,
        resource: ResourceKind,
        period: Option<&str>,
    ) -> TollgateResult<u64> {
        let key = counter_key(tenant_id, resource, period);

        let mut result = self
            .db
            .query("SELECT count FROM type::thing('usage_counter', $key)")
            .bind(("key", key))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountField> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    async fn increment(
        &self,
        tenant_id: Uuid,
        resource: ResourceKind,
        period: Option<&str>,
    ) -> TollgateResult<u64> {
        let key = self.ensure_counter(tenant_id, resource, period).await?;

        let result = self
            .db
            .query("UPDATE type::thing('usage_counter', $key) SET count += 1")
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<CountField> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "usage_counter".into(),
            id: key,
        })?;
        Ok(row.count)
    }

    async fn increment_if_below(
        &self,
        tenant_id: Uuid,
        resource: ResourceKind,
        period: Option<&str>,
        limit: u64,
    ) -> TollgateResult<bool> {
        let key = self.ensure_counter(tenant_id, resource, period).await?;

        // Single conditional statement: the WHERE clause and the
        // increment apply to one record atomically, so concurrent
        // callers cannot drive the count past the limit.
        let result = self
            .db
            .query(
                "UPDATE type::thing('usage_counter', $key) \
                 SET count += 1 WHERE count < $limit",
            )
            .bind(("key", key))
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<CountField> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }
}
