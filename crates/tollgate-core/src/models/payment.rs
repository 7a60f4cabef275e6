//! Manual payment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A payment recorded by a privileged operator outside the payment
/// gateway (bank transfer, invoice settlement, goodwill credit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualPayment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub subscription_id: Uuid,
    /// Amount in the smallest currency unit.
    pub amount: u64,
    /// `INV-<YYYYMMDD>-<seq>`, sequence monotonic per UTC day.
    pub invoice_number: String,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}
