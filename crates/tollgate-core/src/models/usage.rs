//! Usage counter domain model.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The resource types a plan can limit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Documents,
    Websites,
    MonthlyChats,
}

impl ResourceKind {
    /// Display label used as the subject of limit-denial messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Documents => "Document",
            ResourceKind::Websites => "Website",
            ResourceKind::MonthlyChats => "Chat message",
        }
    }

    /// Unit noun used inside limit-denial messages.
    pub fn unit(&self) -> &'static str {
        match self {
            ResourceKind::Documents => "documents",
            ResourceKind::Websites => "websites",
            ResourceKind::MonthlyChats => "messages",
        }
    }

    /// Counter period key for a given instant.
    ///
    /// Documents and websites are cumulative (`None`); chat messages
    /// reset per calendar month (`Some("YYYY-MM")`).
    pub fn period_key(&self, now: DateTime<Utc>) -> Option<String> {
        match self {
            ResourceKind::Documents | ResourceKind::Websites => None,
            ResourceKind::MonthlyChats => Some(format!("{:04}-{:02}", now.year(), now.month())),
        }
    }
}

/// First instant of the calendar month after `now`, i.e. when the
/// monthly chat counter next resets.
pub fn next_month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    // The first of a month at midnight always exists.
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap()
}

/// A per-tenant, per-resource usage count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageCounter {
    pub tenant_id: Uuid,
    pub resource: ResourceKind,
    /// `None` for cumulative resources, `Some("YYYY-MM")` for monthly.
    pub period: Option<String>,
    pub count: u64,
}

/// Used/limit/remaining triple for one resource, for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceUsage {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
}

impl ResourceUsage {
    pub fn new(used: u64, limit: u64) -> Self {
        Self {
            used,
            limit,
            remaining: limit.saturating_sub(used),
        }
    }
}

/// Monthly chat usage, which additionally reports its reset instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatUsage {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
    pub resets_at: DateTime<Utc>,
}

/// Combined usage summary for a tenant. Read aggregation only; has no
/// bearing on any decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    pub documents: ResourceUsage,
    pub websites: ResourceUsage,
    pub monthly_chats: ChatUsage,
}
