//! SurrealDB implementation of [`OverrideRepository`].
//!
//! The manual-payment commit runs as one SurrealDB transaction:
//! payment row, subscription update, and audit record succeed or fail
//! together, which is what keeps the one-mutation-one-audit-record
//! invariant honest.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::sql::Datetime;
use surrealdb::{Connection, Surreal};
use tollgate_core::error::TollgateResult;
use tollgate_core::models::payment::ManualPayment;
use tollgate_core::repository::{CommitManualPayment, CommittedOverride, OverrideRepository};
use uuid::Uuid;

use super::audit::{action_type_to_str, AuditRow};
use super::subscription::{status_to_str, SubscriptionRowWithId};
use crate::error::DbError;

#[derive(Debug, Deserialize)]
struct SequenceRow {
    n: u64,
}

#[derive(Debug, Deserialize)]
struct PaymentRowWithId {
    record_id: String,
    tenant_id: String,
    subscription_id: String,
    amount: u64,
    invoice_number: String,
    recorded_by: String,
    created_at: DateTime<Utc>,
}

impl PaymentRowWithId {
    fn try_into_payment(self) -> Result<ManualPayment, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?;
        let subscription_id = Uuid::parse_str(&self.subscription_id)
            .map_err(|e| DbError::Migration(format!("invalid subscription UUID: {e}")))?;
        let recorded_by = Uuid::parse_str(&self.recorded_by)
            .map_err(|e| DbError::Migration(format!("invalid recorder UUID: {e}")))?;
        Ok(ManualPayment {
            id,
            tenant_id,
            subscription_id,
            amount: self.amount,
            invoice_number: self.invoice_number,
            recorded_by,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the manual override commit.
#[derive(Clone)]
pub struct SurrealOverrideRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOverrideRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OverrideRepository for SurrealOverrideRepository<C> {
    async fn next_invoice_sequence(&self, day: &str) -> TollgateResult<u64> {
        let day_owned = day.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::thing('invoice_seq', $day) SET \
                 day = $day, n += 1",
            )
            .bind(("day", day_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<SequenceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "invoice_seq".into(),
            id: day_owned,
        })?;
        Ok(row.n)
    }

    async fn commit_manual_payment(
        &self,
        input: CommitManualPayment,
    ) -> TollgateResult<CommittedOverride> {
        let payment_id = Uuid::new_v4().to_string();
        let audit_id = Uuid::new_v4().to_string();
        let subscription_id = input.subscription_id.to_string();

        let mut sub_sets = vec!["updated_at = time::now()".to_string()];
        if input.new_status.is_some() {
            sub_sets.push("status = $new_status".into());
        }
        if input.new_period_end.is_some() {
            sub_sets.push("current_period_end = $new_period_end".into());
        }

        let sql = format!(
            "BEGIN TRANSACTION; \
             IF !record::exists(type::thing('subscription', $subscription_id)) \
                 {{ THROW 'subscription not found' }}; \
             IF (SELECT VALUE updated_at FROM ONLY \
                 type::thing('subscription', $subscription_id)) \
                 != $expected_updated_at \
                 {{ THROW 'subscription modified' }}; \
             CREATE type::thing('manual_payment', $payment_id) SET \
                 tenant_id = $tenant_id, \
                 subscription_id = $subscription_id, \
                 amount = $amount, \
                 invoice_number = $invoice_number, \
                 recorded_by = $recorded_by; \
             UPDATE type::thing('subscription', $subscription_id) SET {}; \
             CREATE type::thing('audit_record', $audit_id) SET \
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
             COMMIT TRANSACTION; \
             SELECT meta::id(id) AS record_id, * \
                 FROM type::thing('manual_payment', $payment_id); \
             SELECT meta::id(id) AS record_id, * \
                 FROM type::thing('subscription', $subscription_id); \
             SELECT meta::id(id) AS record_id, * \
                 FROM type::thing('audit_record', $audit_id)",
            sub_sets.join(", "),
        );

        let audit = input.audit;
        let mut query = self
            .db
            .query(sql)
            .bind(("payment_id", payment_id))
            .bind(("audit_id", audit_id))
            .bind(("subscription_id", subscription_id))
            .bind((
                "expected_updated_at",
                Datetime::from(input.expected_updated_at),
            ))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("amount", input.amount))
            .bind(("invoice_number", input.invoice_number))
            .bind(("recorded_by", audit.actor_user_id.to_string()))
            .bind(("actor_user_id", audit.actor_user_id.to_string()))
            .bind(("actor_email", audit.actor_email))
            .bind(("actor_display_name", audit.actor_display_name))
            .bind(("action_type", action_type_to_str(audit.action_type)))
            .bind(("target_type", audit.target_type))
            .bind(("target_id", audit.target_id))
            .bind((
                "affected_tenant_id",
                audit.affected_tenant_id.map(|t| t.to_string()),
            ))
            .bind(("state_before", audit.state_before))
            .bind(("state_after", audit.state_after))
            .bind(("justification", audit.justification))
            .bind(("caller_address", audit.caller_address))
            .bind(("caller_agent", audit.caller_agent));
        if let Some(status) = input.new_status {
            query = query.bind(("new_status", status_to_str(status)));
        }
        if let Some(end) = input.new_period_end {
            query = query.bind(("new_period_end", Datetime::from(end)));
        }

        let result = query.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| {
            let msg = e.to_string();
            if msg.contains("subscription not found") {
                DbError::NotFound {
                    entity: "subscription".into(),
                    id: input.subscription_id.to_string(),
                }
            } else if msg.contains("subscription modified") {
                DbError::Conflict {
                    entity: "subscription".into(),
                }
            } else {
                DbError::Migration(msg)
            }
        })?;

        // The three trailing SELECTs are the last three result slots;
        // indexing from the back sidesteps how many slots the
        // transaction body produced.
        let n = result.num_statements();
        let payment_rows: Vec<PaymentRowWithId> = result.take(n - 3).map_err(DbError::from)?;
        let sub_rows: Vec<SubscriptionRowWithId> = result.take(n - 2).map_err(DbError::from)?;
        let audit_rows: Vec<AuditRow> = result.take(n - 1).map_err(DbError::from)?;

        let payment = payment_rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Migration("manual payment row missing after commit".into()))?
            .try_into_payment()?;
        let subscription = sub_rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Migration("subscription row missing after commit".into()))?
            .try_into_subscription()?;
        let audit = audit_rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Migration("audit row missing after commit".into()))?
            .try_into_record()?;

        Ok(CommittedOverride {
            payment,
            subscription,
            audit,
        })
    }
}
