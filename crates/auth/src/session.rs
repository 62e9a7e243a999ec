use furnerp_core::{TenantId, UserId};

use crate::capability::CapabilitySet;
use crate::roles::{Role, RolePolicy};

/// Authenticated session, passed explicitly to every operation.
///
/// Built once at sign-in from the identity provider's claims and the tenant's
/// [`RolePolicy`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    tenant_id: TenantId,
    user_id: UserId,
    display_name: String,
    roles: Vec<Role>,
    capabilities: CapabilitySet,
}

impl SessionContext {
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        display_name: impl Into<String>,
        roles: Vec<Role>,
        policy: &RolePolicy,
    ) -> Self {
        let capabilities = policy.capabilities_for(&roles);
        Self {
            tenant_id,
            user_id,
            display_name: display_name.into(),
            roles,
            capabilities,
        }
    }

    /// Session with an explicit capability set (service accounts, tests).
    pub fn with_capabilities(
        tenant_id: TenantId,
        user_id: UserId,
        display_name: impl Into<String>,
        capabilities: CapabilitySet,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            display_name: display_name.into(),
            roles: Vec::new(),
            capabilities,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }
}
