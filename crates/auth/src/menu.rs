//! ERP module visibility derived from capabilities.

use serde::Serialize;

use crate::capability::{Capability, CapabilitySet};

/// Top-level ERP modules shown in the navigation menu.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErpModule {
    Dashboard,
    Crm,
    Sales,
    Inventory,
    Manufacturing,
    Accounting,
    Hr,
    Pos,
    Ai,
}

impl ErpModule {
    pub const ALL: [ErpModule; 9] = [
        ErpModule::Dashboard,
        ErpModule::Crm,
        ErpModule::Sales,
        ErpModule::Inventory,
        ErpModule::Manufacturing,
        ErpModule::Accounting,
        ErpModule::Hr,
        ErpModule::Pos,
        ErpModule::Ai,
    ];

    /// Capability needed to see the module; `None` means every signed-in user.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            ErpModule::Dashboard => None,
            ErpModule::Crm => Some(Capability::CrmRead),
            ErpModule::Sales => Some(Capability::SalesRead),
            ErpModule::Inventory => Some(Capability::InventoryRead),
            ErpModule::Manufacturing => Some(Capability::ManufacturingRead),
            ErpModule::Accounting => Some(Capability::AccountingRead),
            ErpModule::Hr => Some(Capability::HrRead),
            ErpModule::Pos => Some(Capability::PosAccess),
            ErpModule::Ai => Some(Capability::AiGenerate),
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            ErpModule::Dashboard => "/dashboard",
            ErpModule::Crm => "/crm",
            ErpModule::Sales => "/sales",
            ErpModule::Inventory => "/inventory",
            ErpModule::Manufacturing => "/manufacturing",
            ErpModule::Accounting => "/accounting",
            ErpModule::Hr => "/hr",
            ErpModule::Pos => "/pos",
            ErpModule::Ai => "/ai",
        }
    }
}

/// Modules the menu should show for `caps`, in menu order.
pub fn visible_modules(caps: CapabilitySet) -> impl Iterator<Item = ErpModule> {
    ErpModule::ALL
        .into_iter()
        .filter(move |m| m.required_capability().is_none_or(|c| caps.allows(c)))
}
