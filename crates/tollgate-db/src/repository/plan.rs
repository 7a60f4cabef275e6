//! SurrealDB implementation of [`PlanRepository`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tollgate_core::error::TollgateResult;
use tollgate_core::models::plan::{CreatePlan, Plan};
use tollgate_core::repository::{PaginatedResult, Pagination, PlanRepository};
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct PlanRow {
    name: String,
    max_documents: u64,
    max_websites: u64,
    monthly_chat_messages: u64,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct PlanRowWithId {
    record_id: String,
    name: String,
    max_documents: u64,
    max_websites: u64,
    monthly_chat_messages: u64,
    created_at: DateTime<Utc>,
}

fn row_to_plan(row: PlanRow, id: Uuid) -> Plan {
    Plan {
        id,
        name: row.name,
        max_documents: row.max_documents,
        max_websites: row.max_websites,
        monthly_chat_messages: row.monthly_chat_messages,
        created_at: row.created_at,
    }
}

impl PlanRowWithId {
    fn try_into_plan(self) -> Result<Plan, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Plan {
            id,
            name: self.name,
            max_documents: self.max_documents,
            max_websites: self.max_websites,
            monthly_chat_messages: self.monthly_chat_messages,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Plan repository.
#[derive(Clone)]
pub struct SurrealPlanRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPlanRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PlanRepository for SurrealPlanRepository<C> {
    async fn create(&self, input: CreatePlan) -> TollgateResult<Plan> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('plan', $id) SET \
                 name = $name, \
                 max_documents = $max_documents, \
                 max_websites = $max_websites, \
                 monthly_chat_messages = $monthly_chat_messages",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("max_documents", input.max_documents))
            .bind(("max_websites", input.max_websites))
            .bind(("monthly_chat_messages", input.monthly_chat_messages))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "plan".into(),
            id: id_str,
        })?;

        Ok(row_to_plan(row, id))
    }

    async fn get_by_id(&self, id: Uuid) -> TollgateResult<Plan> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('plan', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "plan".into(),
            id: id_str,
        })?;

        Ok(row_to_plan(row, id))
    }

    async fn list(&self, pagination: Pagination) -> TollgateResult<PaginatedResult<Plan>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM plan \
                 ORDER BY created_at ASC LIMIT $limit START $offset; \
                 SELECT count() AS total FROM plan GROUP ALL",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRowWithId> = result.take(0).map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let items = rows
            .into_iter()
            .map(|r| r.try_into_plan())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
