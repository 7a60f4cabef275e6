//! SurrealDB repository implementations for the `tollgate-core` traits.

mod audit;
mod override_commit;
mod plan;
mod subscription;
mod usage;

pub use audit::SurrealAuditRepository;
pub use override_commit::SurrealOverrideRepository;
pub use plan::SurrealPlanRepository;
pub use subscription::SurrealSubscriptionRepository;
pub use usage::SurrealUsageRepository;
