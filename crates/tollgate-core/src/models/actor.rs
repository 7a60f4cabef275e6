//! Privileged actor and capability types.
//!
//! Capabilities are derived from externally-verified claims; the core
//! trusts the flags but performs no cryptographic verification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The privilege levels a claim set can carry.
///
/// The two capabilities are independent: holding one never implies
/// the other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Capability {
    TenantAdmin,
    CrossTenantOperator,
}

impl Capability {
    fn bit(self) -> u8 {
        match self {
            Capability::TenantAdmin => 0b01,
            Capability::CrossTenantOperator => 0b10,
        }
    }
}

/// An explicit finite set of capabilities.
///
/// Deliberately a bitset over a closed enum rather than a list of
/// strings, so guard functions are total and typo-proof.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, cap: Capability) -> Self {
        self.0 |= cap.bit();
        self
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Capabilities present, for denial logging.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        [Capability::TenantAdmin, Capability::CrossTenantOperator]
            .into_iter()
            .filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

/// An authenticated caller, as seen by privileged endpoints.
///
/// Lifetime is one request; built fresh from the verified claim set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivilegedActor {
    pub user_id: Uuid,
    /// The caller's own tenant, used to force scoping for
    /// non-operators.
    pub tenant_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub capabilities: CapabilitySet,
}
