use serde::{Deserialize, Serialize};

/// A module-level right granted to a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "pos.access")]
    PosAccess,
    #[serde(rename = "pos.checkout")]
    PosCheckout,
    #[serde(rename = "inventory.read")]
    InventoryRead,
    #[serde(rename = "inventory.write")]
    InventoryWrite,
    #[serde(rename = "sales.read")]
    SalesRead,
    #[serde(rename = "sales.write")]
    SalesWrite,
    #[serde(rename = "crm.read")]
    CrmRead,
    #[serde(rename = "accounting.read")]
    AccountingRead,
    #[serde(rename = "hr.read")]
    HrRead,
    #[serde(rename = "manufacturing.read")]
    ManufacturingRead,
    #[serde(rename = "ai.generate")]
    AiGenerate,
    /// Implies every other capability.
    #[serde(rename = "admin")]
    Admin,
}

impl Capability {
    pub const ALL: [Capability; 12] = [
        Capability::PosAccess,
        Capability::PosCheckout,
        Capability::InventoryRead,
        Capability::InventoryWrite,
        Capability::SalesRead,
        Capability::SalesWrite,
        Capability::CrmRead,
        Capability::AccountingRead,
        Capability::HrRead,
        Capability::ManufacturingRead,
        Capability::AiGenerate,
        Capability::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::PosAccess => "pos.access",
            Capability::PosCheckout => "pos.checkout",
            Capability::InventoryRead => "inventory.read",
            Capability::InventoryWrite => "inventory.write",
            Capability::SalesRead => "sales.read",
            Capability::SalesWrite => "sales.write",
            Capability::CrmRead => "crm.read",
            Capability::AccountingRead => "accounting.read",
            Capability::HrRead => "hr.read",
            Capability::ManufacturingRead => "manufacturing.read",
            Capability::AiGenerate => "ai.generate",
            Capability::Admin => "admin",
        }
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of capabilities, stored as a bitset.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn of(caps: &[Capability]) -> Self {
        caps.iter().copied().collect()
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn union(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 | other.0)
    }

    /// Whether `cap` is granted, directly or through `Admin`.
    pub fn allows(self, cap: Capability) -> bool {
        self.0 & (cap.bit() | Capability::Admin.bit()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Capabilities explicitly present in the set.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.0 & c.bit() != 0)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

impl From<Vec<Capability>> for CapabilitySet {
    fn from(value: Vec<Capability>) -> Self {
        value.into_iter().collect()
    }
}

impl From<CapabilitySet> for Vec<Capability> {
    fn from(value: CapabilitySet) -> Self {
        value.iter().collect()
    }
}
