//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, Deserialize)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Plans (global scope, immutable per version)
-- =======================================================================
DEFINE TABLE plan SCHEMAFULL;
DEFINE FIELD name ON TABLE plan TYPE string;
DEFINE FIELD max_documents ON TABLE plan TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD max_websites ON TABLE plan TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD monthly_chat_messages ON TABLE plan TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD created_at ON TABLE plan TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Subscriptions (one per tenant)
-- =======================================================================
DEFINE TABLE subscription SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE subscription TYPE string;
DEFINE FIELD plan_id ON TABLE subscription TYPE string;
DEFINE FIELD status ON TABLE subscription TYPE string \
    ASSERT $value IN ['Active', 'Trialing', 'PastDue', 'Expired', \
    'Cancelled', 'Pending'];
DEFINE FIELD current_period_start ON TABLE subscription \
    TYPE option<datetime>;
DEFINE FIELD current_period_end ON TABLE subscription \
    TYPE option<datetime>;
DEFINE FIELD trial_ends_at ON TABLE subscription TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE subscription TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE subscription TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subscription_tenant ON TABLE subscription \
    COLUMNS tenant_id UNIQUE;

-- =======================================================================
-- Usage counters (keyed by tenant + resource + period)
-- =======================================================================
DEFINE TABLE usage_counter SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE usage_counter TYPE string;
DEFINE FIELD resource ON TABLE usage_counter TYPE string \
    ASSERT $value IN ['Documents', 'Websites', 'MonthlyChats'];
DEFINE FIELD period ON TABLE usage_counter TYPE option<string>;
DEFINE FIELD count ON TABLE usage_counter TYPE int DEFAULT 0 \
    ASSERT $value >= 0;

-- =======================================================================
-- Manual payments (privileged override workflow)
-- =======================================================================
DEFINE TABLE manual_payment SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE manual_payment TYPE string;
DEFINE FIELD subscription_id ON TABLE manual_payment TYPE string;
DEFINE FIELD amount ON TABLE manual_payment TYPE int \
    ASSERT $value > 0;
DEFINE FIELD invoice_number ON TABLE manual_payment TYPE string;
DEFINE FIELD recorded_by ON TABLE manual_payment TYPE string;
DEFINE FIELD created_at ON TABLE manual_payment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_payment_invoice ON TABLE manual_payment \
    COLUMNS invoice_number UNIQUE;
DEFINE INDEX idx_payment_tenant ON TABLE manual_payment \
    COLUMNS tenant_id;

-- =======================================================================
-- Invoice sequence (one row per UTC day)
-- =======================================================================
DEFINE TABLE invoice_seq SCHEMAFULL;
DEFINE FIELD day ON TABLE invoice_seq TYPE string;
DEFINE FIELD n ON TABLE invoice_seq TYPE int DEFAULT 0;

-- =======================================================================
-- Audit ledger (append-only)
-- =======================================================================
DEFINE TABLE audit_record SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_user_id ON TABLE audit_record TYPE string;
DEFINE FIELD actor_email ON TABLE audit_record TYPE string;
DEFINE FIELD actor_display_name ON TABLE audit_record TYPE string;
DEFINE FIELD action_type ON TABLE audit_record TYPE string \
    ASSERT $value IN ['ManualPayment', 'SubscriptionOverride', \
    'ContentDeletion', 'RoleChange'];
DEFINE FIELD target_type ON TABLE audit_record TYPE string;
DEFINE FIELD target_id ON TABLE audit_record TYPE string;
DEFINE FIELD affected_tenant_id ON TABLE audit_record \
    TYPE option<string>;
DEFINE FIELD state_before ON TABLE audit_record TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD state_after ON TABLE audit_record TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD justification ON TABLE audit_record TYPE string;
DEFINE FIELD caller_address ON TABLE audit_record TYPE option<string>;
DEFINE FIELD caller_agent ON TABLE audit_record TYPE option<string>;
DEFINE FIELD created_at ON TABLE audit_record TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_tenant_time ON TABLE audit_record \
    COLUMNS affected_tenant_id, created_at;
DEFINE INDEX idx_audit_actor ON TABLE audit_record \
    COLUMNS actor_user_id;
";

// -----------------------------------------------------------------------
// Migration runner
// -----------------------------------------------------------------------

pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn audit_table_forbids_update_and_delete() {
        let ddl = SCHEMA_V1;
        assert!(ddl.contains("FOR update NONE"));
        assert!(ddl.contains("FOR delete NONE"));
    }
}
