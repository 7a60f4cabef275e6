//! Transport abstraction between the client and the authority.
//!
//! The transport is injectable so the retry/fail-open semantics can be
//! tested against simulated authorities, and so every consuming
//! service shares one resilience implementation regardless of how it
//! reaches the authority.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tollgate_core::models::decision::{EntitlementDecision, Operation};
use tollgate_core::models::usage::UsageSummary;
use uuid::Uuid;

use crate::error::TransportError;

/// One attempt against the authority. Implementations perform no
/// retrying of their own; the client owns that.
pub trait DecisionTransport: Send + Sync {
    fn fetch_decision(
        &self,
        tenant_id: Uuid,
        operation: Operation,
    ) -> impl Future<Output = Result<EntitlementDecision, TransportError>> + Send;

    fn fetch_usage_summary(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = Result<UsageSummary, TransportError>> + Send;
}

#[derive(Debug, Serialize)]
struct CheckRequest {
    tenant_id: Uuid,
    operation: Operation,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    allowed: bool,
    reason: Option<String>,
}

/// HTTP transport against the authority's REST surface.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// `base_url` without a trailing slash, e.g.
    /// `http://entitlements.internal:8080`.
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }
}

impl DecisionTransport for HttpTransport {
    async fn fetch_decision(
        &self,
        tenant_id: Uuid,
        operation: Operation,
    ) -> Result<EntitlementDecision, TransportError> {
        let url = format!("{}/v1/entitlements/check", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&CheckRequest {
                tenant_id,
                operation,
            })
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body: CheckResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        Ok(EntitlementDecision {
            allowed: body.allowed,
            reason: body.reason,
        })
    }

    async fn fetch_usage_summary(&self, tenant_id: Uuid) -> Result<UsageSummary, TransportError> {
        let url = format!("{}/v1/tenants/{}/usage", self.base_url, tenant_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
