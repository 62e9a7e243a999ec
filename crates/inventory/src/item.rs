use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use furnerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money, TenantId};
use furnerp_events::Event;

use crate::catalog::{CatalogItem, CatalogItemId};

/// Identifies the sale a decrement belongs to (the order id).
///
/// A stock stream applies each reference at most once, so a retried checkout
/// cannot sell the same units twice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleReference(pub AggregateId);

impl core::fmt::Display for SaleReference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: StockItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockItem {
    id: CatalogItemId,
    tenant_id: Option<TenantId>,
    name: String,
    sku: String,
    category: String,
    unit_price: Money,
    on_hand: u32,
    applied_sales: HashSet<SaleReference>,
    version: u64,
    created: bool,
}

impl StockItem {
    /// Create an empty, not-yet-registered instance for rehydration.
    pub fn empty(id: CatalogItemId) -> Self {
        Self {
            id,
            tenant_id: None,
            name: String::new(),
            sku: String::new(),
            category: String::new(),
            unit_price: Money::ZERO,
            on_hand: 0,
            applied_sales: HashSet::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CatalogItemId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn on_hand(&self) -> u32 {
        self.on_hand
    }

    pub fn is_registered(&self) -> bool {
        self.created
    }

    pub fn has_applied(&self, reference: SaleReference) -> bool {
        self.applied_sales.contains(&reference)
    }

    /// Catalog view of the current state, once registered.
    pub fn to_catalog_item(&self) -> Option<CatalogItem> {
        self.created.then(|| CatalogItem {
            id: self.id,
            name: self.name.clone(),
            sku: self.sku.clone(),
            category: self.category.clone(),
            unit_price: self.unit_price,
            on_hand: self.on_hand,
        })
    }
}

impl AggregateRoot for StockItem {
    type Id = CatalogItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterItem {
    pub tenant_id: TenantId,
    pub item_id: CatalogItemId,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub unit_price: Money,
    pub initial_stock: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Restock (external goods receipt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restock {
    pub tenant_id: TenantId,
    pub item_id: CatalogItemId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DecrementStock (units leaving with a sale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecrementStock {
    pub tenant_id: TenantId,
    pub item_id: CatalogItemId,
    pub quantity: u32,
    pub reference: SaleReference,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCommand {
    RegisterItem(RegisterItem),
    Restock(Restock),
    DecrementStock(DecrementStock),
}

/// Event: ItemRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRegistered {
    pub tenant_id: TenantId,
    pub item_id: CatalogItemId,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub unit_price: Money,
    pub initial_stock: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockRestocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRestocked {
    pub tenant_id: TenantId,
    pub item_id: CatalogItemId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockDecremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecremented {
    pub tenant_id: TenantId,
    pub item_id: CatalogItemId,
    pub quantity: u32,
    pub reference: SaleReference,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    ItemRegistered(ItemRegistered),
    StockRestocked(StockRestocked),
    StockDecremented(StockDecremented),
}

impl Event for StockEvent {
    const STREAM: &'static str = "inventory.stock_item";

    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::ItemRegistered(_) => "inventory.item.registered",
            StockEvent::StockRestocked(_) => "inventory.stock.restocked",
            StockEvent::StockDecremented(_) => "inventory.stock.decremented",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::ItemRegistered(e) => e.occurred_at,
            StockEvent::StockRestocked(e) => e.occurred_at,
            StockEvent::StockDecremented(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockItem {
    type Command = StockCommand;
    type Event = StockEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StockEvent::ItemRegistered(e) => {
                self.id = e.item_id;
                self.tenant_id = Some(e.tenant_id);
                self.name = e.name.clone();
                self.sku = e.sku.clone();
                self.category = e.category.clone();
                self.unit_price = e.unit_price;
                self.on_hand = e.initial_stock;
                self.created = true;
            }
            StockEvent::StockRestocked(e) => {
                self.on_hand = self.on_hand.saturating_add(e.quantity);
            }
            StockEvent::StockDecremented(e) => {
                self.on_hand = self.on_hand.saturating_sub(e.quantity);
                self.applied_sales.insert(e.reference);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StockCommand::RegisterItem(cmd) => self.handle_register(cmd),
            StockCommand::Restock(cmd) => self.handle_restock(cmd),
            StockCommand::DecrementStock(cmd) => self.handle_decrement(cmd),
        }
    }
}

impl StockItem {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_item_id(&self, item_id: CatalogItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterItem) -> Result<Vec<StockEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already registered"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if cmd.unit_price == Money::ZERO {
            return Err(DomainError::validation("unit_price must be positive"));
        }

        Ok(vec![StockEvent::ItemRegistered(ItemRegistered {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            name: cmd.name.trim().to_string(),
            sku: cmd.sku.trim().to_string(),
            category: cmd.category.trim().to_string(),
            unit_price: cmd.unit_price,
            initial_stock: cmd.initial_stock,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_restock(&self, cmd: &Restock) -> Result<Vec<StockEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_item_id(cmd.item_id)?;

        if cmd.quantity == 0 {
            return Err(DomainError::validation("restock quantity must be positive"));
        }

        Ok(vec![StockEvent::StockRestocked(StockRestocked {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_decrement(&self, cmd: &DecrementStock) -> Result<Vec<StockEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_item_id(cmd.item_id)?;

        if self.has_applied(cmd.reference) {
            return Ok(vec![]);
        }
        if cmd.quantity == 0 {
            return Err(DomainError::validation("decrement quantity must be positive"));
        }
        if cmd.quantity > self.on_hand {
            return Err(DomainError::invariant(format!(
                "insufficient stock for {} (on hand {}, requested {})",
                self.sku, self.on_hand, cmd.quantity
            )));
        }

        Ok(vec![StockEvent::StockDecremented(StockDecremented {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            quantity: cmd.quantity,
            reference: cmd.reference,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_item_id() -> CatalogItemId {
        CatalogItemId::new(AggregateId::new())
    }

    fn registered(tenant_id: TenantId, item_id: CatalogItemId, stock: u32) -> StockItem {
        let mut item = StockItem::empty(item_id);
        let events = item
            .handle(&StockCommand::RegisterItem(RegisterItem {
                tenant_id,
                item_id,
                name: "Teak Dining Chair".to_string(),
                sku: "CHR-TEAK-01".to_string(),
                category: "Dining".to_string(),
                unit_price: Money::from_minor(750_000),
                initial_stock: stock,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        for e in &events {
            item.apply(e);
        }
        item
    }

    fn decrement(
        tenant_id: TenantId,
        item_id: CatalogItemId,
        quantity: u32,
        reference: SaleReference,
    ) -> StockCommand {
        StockCommand::DecrementStock(DecrementStock {
            tenant_id,
            item_id,
            quantity,
            reference,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn register_sets_catalog_view() {
        let tenant_id = TenantId::new();
        let item_id = test_item_id();
        let item = registered(tenant_id, item_id, 4);

        let view = item.to_catalog_item().unwrap();
        assert_eq!(view.on_hand, 4);
        assert_eq!(view.sku, "CHR-TEAK-01");
        assert_eq!(item.version(), 1);
    }

    #[test]
    fn unregistered_item_has_no_catalog_view() {
        assert!(StockItem::empty(test_item_id()).to_catalog_item().is_none());
    }

    #[test]
    fn register_twice_conflicts() {
        let tenant_id = TenantId::new();
        let item_id = test_item_id();
        let item = registered(tenant_id, item_id, 1);

        let err = item
            .handle(&StockCommand::RegisterItem(RegisterItem {
                tenant_id,
                item_id,
                name: "Again".to_string(),
                sku: "X".to_string(),
                category: String::new(),
                unit_price: Money::from_minor(1),
                initial_stock: 0,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn decrement_below_zero_is_rejected() {
        let tenant_id = TenantId::new();
        let item_id = test_item_id();
        let item = registered(tenant_id, item_id, 2);

        let err = item
            .handle(&decrement(tenant_id, item_id, 3, SaleReference(AggregateId::new())))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("insufficient stock") => {}
            other => panic!("expected insufficient stock, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_reference_emits_nothing() {
        let tenant_id = TenantId::new();
        let item_id = test_item_id();
        let mut item = registered(tenant_id, item_id, 5);
        let reference = SaleReference(AggregateId::new());

        let events = item.handle(&decrement(tenant_id, item_id, 2, reference)).unwrap();
        assert_eq!(events.len(), 1);
        item.apply(&events[0]);
        assert_eq!(item.on_hand(), 3);

        let replay = item.handle(&decrement(tenant_id, item_id, 2, reference)).unwrap();
        assert!(replay.is_empty());
        assert_eq!(item.on_hand(), 3);
    }

    #[test]
    fn restock_requires_positive_quantity() {
        let tenant_id = TenantId::new();
        let item_id = test_item_id();
        let item = registered(tenant_id, item_id, 0);

        let err = item
            .handle(&StockCommand::Restock(Restock {
                tenant_id,
                item_id,
                quantity: 0,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn other_tenant_cannot_decrement() {
        let item_id = test_item_id();
        let item = registered(TenantId::new(), item_id, 5);

        let err = item
            .handle(&decrement(TenantId::new(), item_id, 1, SaleReference(AggregateId::new())))
            .unwrap_err();
        assert_eq!(err, DomainError::invariant("tenant mismatch"));
    }

    proptest! {
        /// Property: whatever sequence of decrements is attempted, accepted ones
        /// never take stock below zero and the remaining stock adds up.
        #[test]
        fn stock_never_goes_negative(
            initial in 0u32..50,
            requests in prop::collection::vec(1u32..10, 0..20)
        ) {
            let tenant_id = TenantId::new();
            let item_id = test_item_id();
            let mut item = registered(tenant_id, item_id, initial);
            let mut sold = 0u32;

            for qty in requests {
                let cmd = decrement(tenant_id, item_id, qty, SaleReference(AggregateId::new()));
                if let Ok(events) = item.handle(&cmd) {
                    for e in &events {
                        item.apply(e);
                    }
                    sold += qty;
                }
            }

            prop_assert!(sold <= initial);
            prop_assert_eq!(item.on_hand(), initial - sold);
        }
    }
}
