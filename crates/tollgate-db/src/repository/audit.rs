//! SurrealDB implementation of [`AuditRepository`].
//!
//! Append and read only; the table permissions additionally forbid
//! update and delete at the storage layer.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tollgate_core::error::TollgateResult;
use tollgate_core::models::audit::{
    AuditActionType, AuditFilter, AuditRecord, CreateAuditRecord,
};
use tollgate_core::repository::{AuditRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, Deserialize)]
pub(crate) struct AuditRow {
    pub(crate) record_id: String,
    pub(crate) actor_user_id: String,
    pub(crate) actor_email: String,
    pub(crate) actor_display_name: String,
    pub(crate) action_type: String,
    pub(crate) target_type: String,
    pub(crate) target_id: String,
    pub(crate) affected_tenant_id: Option<String>,
    pub(crate) state_before: serde_json::Value,
    pub(crate) state_after: serde_json::Value,
    pub(crate) justification: String,
    pub(crate) caller_address: Option<String>,
    pub(crate) caller_agent: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

pub(crate) fn parse_action_type(s: &str) -> Result<AuditActionType, DbError> {
    match s {
        "ManualPayment" => Ok(AuditActionType::ManualPayment),
        "SubscriptionOverride" => Ok(AuditActionType::SubscriptionOverride),
        "ContentDeletion" => Ok(AuditActionType::ContentDeletion),
        "RoleChange" => Ok(AuditActionType::RoleChange),
        other => Err(DbError::Migration(format!(
            "unknown audit action type: {other}"
        ))),
    }
}

pub(crate) fn action_type_to_str(a: AuditActionType) -> &'static str {
    match a {
        AuditActionType::ManualPayment => "ManualPayment",
        AuditActionType::SubscriptionOverride => "SubscriptionOverride",
        AuditActionType::ContentDeletion => "ContentDeletion",
        AuditActionType::RoleChange => "RoleChange",
    }
}

impl AuditRow {
    pub(crate) fn try_into_record(self) -> Result<AuditRecord, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let actor_user_id = Uuid::parse_str(&self.actor_user_id)
            .map_err(|e| DbError::Migration(format!("invalid actor UUID: {e}")))?;
        let affected_tenant_id = self
            .affected_tenant_id
            .map(|s| {
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))
            })
            .transpose()?;
        Ok(AuditRecord {
            id,
            actor_user_id,
            actor_email: self.actor_email,
            actor_display_name: self.actor_display_name,
            action_type: parse_action_type(&self.action_type)?,
            target_type: self.target_type,
            target_id: self.target_id,
            affected_tenant_id,
            state_before: self.state_before,
            state_after: self.state_after,
            justification: self.justification,
            caller_address: self.caller_address,
            caller_agent: self.caller_agent,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the append-only audit ledger.
#[derive(Clone)]
pub struct SurrealAuditRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditRepository for SurrealAuditRepository<C> {
    async fn append(&self, input: CreateAuditRecord) -> TollgateResult<AuditRecord> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('audit_record', $id) SET \
                 actor_user_id = $actor_user_id, \
                 actor_email = $actor_email, \
                 actor_display_name = $actor_display_name, \
                 action_type = $action_type, \
                 target_type = $target_type, \
                 target_id = $target_id, \
                 affected_tenant_id = $affected_tenant_id, \
                 state_before = $state_before, \
                 state_after = $state_after, \
                 justification = $justification, \
                 caller_address = $caller_address, \
                 caller_agent = $caller_agent; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::thing('audit_record', $id)",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_user_id", input.actor_user_id.to_string()))
            .bind(("actor_email", input.actor_email))
            .bind(("actor_display_name", input.actor_display_name))
            .bind(("action_type", action_type_to_str(input.action_type)))
            .bind(("target_type", input.target_type))
            .bind(("target_id", input.target_id))
            .bind((
                "affected_tenant_id",
                input.affected_tenant_id.map(|t| t.to_string()),
            ))
            .bind(("state_before", input.state_before))
            .bind(("state_after", input.state_after))
            .bind(("justification", input.justification))
            .bind(("caller_address", input.caller_address))
            .bind(("caller_agent", input.caller_agent))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AuditRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_record".into(),
            id: id_str,
        })?;

        row.try_into_record().map_err(Into::into)
    }

    async fn list(
        &self,
        filter: AuditFilter,
        pagination: Pagination,
    ) -> TollgateResult<PaginatedResult<AuditRecord>> {
        let mut conditions = Vec::new();
        if filter.actor_user_id.is_some() {
            conditions.push("actor_user_id = $actor_user_id");
        }
        if filter.action_type.is_some() {
            conditions.push("action_type = $action_type");
        }
        if filter.target_type.is_some() {
            conditions.push("target_type = $target_type");
        }
        if filter.target_id.is_some() {
            conditions.push("target_id = $target_id");
        }
        if filter.affected_tenant_id.is_some() {
            conditions.push("affected_tenant_id = $affected_tenant_id");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_record{where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset; \
             SELECT count() AS total FROM audit_record{where_clause} GROUP ALL",
        );

        let mut query = self
            .db
            .query(sql)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(actor) = filter.actor_user_id {
            query = query.bind(("actor_user_id", actor.to_string()));
        }
        if let Some(action) = filter.action_type {
            query = query.bind(("action_type", action_type_to_str(action)));
        }
        if let Some(target_type) = filter.target_type {
            query = query.bind(("target_type", target_type));
        }
        if let Some(target_id) = filter.target_id {
            query = query.bind(("target_id", target_id));
        }
        if let Some(tenant) = filter.affected_tenant_id {
            query = query.bind(("affected_tenant_id", tenant.to_string()));
        }

        let mut result = query.await.map_err(DbError::from)?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let items = rows
            .into_iter()
            .map(|r| r.try_into_record())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
