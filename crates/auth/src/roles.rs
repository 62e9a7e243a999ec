use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::capability::{Capability, CapabilitySet};

/// Role identifier used for RBAC.
///
/// Roles stay opaque strings so tenants can define their own; the
/// [`RolePolicy`] decides what each one grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const MANAGER: Role = Role(Cow::Borrowed("manager"));
    pub const CASHIER: Role = Role(Cow::Borrowed("cashier"));
    pub const SALES: Role = Role(Cow::Borrowed("sales"));
    pub const INVENTORY: Role = Role(Cow::Borrowed("inventory"));
    pub const ACCOUNTANT: Role = Role(Cow::Borrowed("accountant"));
    pub const HR: Role = Role(Cow::Borrowed("hr"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role → capability table.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    grants: HashMap<Role, CapabilitySet>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table for a furniture showroom.
    pub fn standard() -> Self {
        use Capability::*;

        Self::new()
            .grant(Role::ADMIN, &[Admin])
            .grant(
                Role::MANAGER,
                &[
                    PosAccess,
                    PosCheckout,
                    InventoryRead,
                    InventoryWrite,
                    SalesRead,
                    SalesWrite,
                    CrmRead,
                    AccountingRead,
                    ManufacturingRead,
                    AiGenerate,
                ],
            )
            .grant(Role::CASHIER, &[PosAccess, PosCheckout, InventoryRead, CrmRead])
            .grant(Role::SALES, &[SalesRead, SalesWrite, CrmRead, InventoryRead, AiGenerate])
            .grant(Role::INVENTORY, &[InventoryRead, InventoryWrite, ManufacturingRead])
            .grant(Role::ACCOUNTANT, &[AccountingRead, SalesRead])
            .grant(Role::HR, &[HrRead])
    }

    /// Add capabilities to a role (merging with any existing grant).
    pub fn grant(mut self, role: Role, caps: &[Capability]) -> Self {
        let entry = self.grants.entry(role).or_default();
        *entry = entry.union(CapabilitySet::of(caps));
        self
    }

    /// Union of the capabilities granted to `roles`. Unknown roles grant nothing.
    pub fn capabilities_for(&self, roles: &[Role]) -> CapabilitySet {
        roles
            .iter()
            .filter_map(|r| self.grants.get(r))
            .fold(CapabilitySet::empty(), |acc, set| acc.union(*set))
    }
}
