//! Privilege gating for administrative endpoints.
//!
//! Callers arrive with an externally-verified claim set already turned
//! into a [`PrivilegedActor`]; the gate only inspects capability flags.

use tracing::warn;
use uuid::Uuid;

use tollgate_core::models::actor::{Capability, PrivilegedActor};

use crate::error::EntitlementError;

/// The tenant scope an endpoint may operate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// Cross-tenant access; only reachable by operators.
    AllTenants,
    Single(Uuid),
}

/// Stateless guard functions consumed by every privileged endpoint.
pub struct PrivilegeGate;

impl PrivilegeGate {
    pub fn require_tenant_admin(actor: &PrivilegedActor) -> Result<(), EntitlementError> {
        if actor.capabilities.contains(Capability::TenantAdmin) {
            return Ok(());
        }
        Self::log_denial(actor, "tenant administrator privileges required");
        Err(EntitlementError::PrivilegeDenied {
            reason: "tenant administrator privileges required".into(),
        })
    }

    /// Independent of tenant-admin: holding one capability never
    /// implies the other.
    pub fn require_cross_tenant_operator(actor: &PrivilegedActor) -> Result<(), EntitlementError> {
        if actor.capabilities.contains(Capability::CrossTenantOperator) {
            return Ok(());
        }
        Self::log_denial(actor, "system administrator privileges required");
        Err(EntitlementError::PrivilegeDenied {
            reason: "system administrator privileges required".into(),
        })
    }

    /// Resolves an optional `tenant_id` filter into an effective scope.
    ///
    /// An absent filter means "all tenants" only for cross-tenant
    /// operators. Everyone else is pinned to their own tenant no
    /// matter what the request supplied.
    pub fn resolve_tenant_scope(
        actor: &PrivilegedActor,
        requested: Option<Uuid>,
    ) -> TenantScope {
        if actor.capabilities.contains(Capability::CrossTenantOperator) {
            match requested {
                Some(tenant_id) => TenantScope::Single(tenant_id),
                None => TenantScope::AllTenants,
            }
        } else {
            TenantScope::Single(actor.tenant_id)
        }
    }

    fn log_denial(actor: &PrivilegedActor, required: &str) {
        let presented: Vec<Capability> = actor.capabilities.iter().collect();
        warn!(
            user_id = %actor.user_id,
            capabilities = ?presented,
            required,
            "privilege denied"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::models::actor::CapabilitySet;

    fn actor(capabilities: CapabilitySet) -> PrivilegedActor {
        PrivilegedActor {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            email: "op@example.com".into(),
            display_name: "Op".into(),
            capabilities,
        }
    }

    #[test]
    fn tenant_admin_does_not_imply_operator() {
        let admin = actor(CapabilitySet::empty().with(Capability::TenantAdmin));
        assert!(PrivilegeGate::require_tenant_admin(&admin).is_ok());
        assert!(PrivilegeGate::require_cross_tenant_operator(&admin).is_err());
    }

    #[test]
    fn operator_does_not_imply_tenant_admin() {
        let op = actor(CapabilitySet::empty().with(Capability::CrossTenantOperator));
        assert!(PrivilegeGate::require_cross_tenant_operator(&op).is_ok());
        assert!(PrivilegeGate::require_tenant_admin(&op).is_err());
    }

    #[test]
    fn non_operator_is_pinned_to_own_tenant() {
        let admin = actor(CapabilitySet::empty().with(Capability::TenantAdmin));
        let foreign = Uuid::new_v4();
        // The supplied filter is ignored for non-operators.
        assert_eq!(
            PrivilegeGate::resolve_tenant_scope(&admin, Some(foreign)),
            TenantScope::Single(admin.tenant_id)
        );
        assert_eq!(
            PrivilegeGate::resolve_tenant_scope(&admin, None),
            TenantScope::Single(admin.tenant_id)
        );
    }

    #[test]
    fn operator_scope_follows_filter() {
        let op = actor(CapabilitySet::empty().with(Capability::CrossTenantOperator));
        let tenant = Uuid::new_v4();
        assert_eq!(
            PrivilegeGate::resolve_tenant_scope(&op, Some(tenant)),
            TenantScope::Single(tenant)
        );
        assert_eq!(
            PrivilegeGate::resolve_tenant_scope(&op, None),
            TenantScope::AllTenants
        );
    }
}
