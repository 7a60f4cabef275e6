//! Entitlement decision and operation types.
//!
//! These types cross the wire between consuming services and the
//! authority, so their serialized forms are part of the protocol.

use serde::{Deserialize, Serialize};

use super::usage::ResourceKind;

/// The gated operations a consuming service can ask about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Pure subscription-status check, no usage counter involved.
    SubscriptionActive,
    UploadDocument,
    IngestWebsite,
    SendChat,
}

impl Operation {
    /// The usage counter this operation consumes, if any.
    pub fn resource(&self) -> Option<ResourceKind> {
        match self {
            Operation::SubscriptionActive => None,
            Operation::UploadDocument => Some(ResourceKind::Documents),
            Operation::IngestWebsite => Some(ResourceKind::Websites),
            Operation::SendChat => Some(ResourceKind::MonthlyChats),
        }
    }

    /// Wire name, as used in check requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SubscriptionActive => "subscription-active",
            Operation::UploadDocument => "upload-document",
            Operation::IngestWebsite => "ingest-website",
            Operation::SendChat => "send-chat",
        }
    }
}

/// The outcome of an entitlement check.
///
/// Transient by design: decisions embed time-sensitive grace-period
/// math and must never be cached beyond the caller's request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntitlementDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl EntitlementDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}
