//! Tollgate Server — Authority process entry point.

use tollgate_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tollgate=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Tollgate authority...");

    let config = DbConfig::default();
    match DbManager::connect(&config).await {
        Ok(manager) => {
            if let Err(e) = tollgate_db::run_migrations(manager.client()).await {
                tracing::error!(error = %e, "Migration failed");
                return;
            }
            tracing::info!("Database ready");
            // TODO: mount the REST surface once the gateway crate lands
        }
        Err(e) => {
            tracing::error!(error = %e, "Database connection failed");
            return;
        }
    }

    tracing::info!("Tollgate authority stopped.");
}
