//! Tollgate Entitlement — subscription-status evaluation, usage-limit
//! enforcement, privilege gating, and the manual override workflow.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod gate;
pub mod limits;
pub mod notify;
pub mod overrides;

pub use config::EntitlementConfig;
pub use error::EntitlementError;
pub use evaluator::EntitlementEvaluator;
pub use gate::{PrivilegeGate, TenantScope};
pub use limits::UsageLimitEnforcer;
pub use notify::Notifier;
pub use overrides::{ManualOverrideService, ManualPaymentRequest, ManualPaymentOutcome};
