//! Notification collaborator interface.

use std::future::Future;

use uuid::Uuid;

/// Fire-and-forget notification delivery.
///
/// Delivery guarantees (retries, queuing) belong to the implementing
/// collaborator; the override workflow only logs failures and never
/// unwinds a committed mutation over them.
pub trait Notifier: Send + Sync {
    fn manual_payment_recorded(
        &self,
        tenant_id: Uuid,
        invoice_number: String,
        amount: u64,
    ) -> impl Future<Output = Result<(), String>> + Send;
}

/// No-op notifier for deployments without an email collaborator.
#[derive(Debug, Clone, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    async fn manual_payment_recorded(
        &self,
        _tenant_id: Uuid,
        _invoice_number: String,
        _amount: u64,
    ) -> Result<(), String> {
        Ok(())
    }
}
