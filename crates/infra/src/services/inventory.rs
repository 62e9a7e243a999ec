use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use furnerp_core::{Aggregate, AggregateId, Money, TenantId};
use furnerp_inventory::{
    CatalogItem, CatalogItemId, CatalogQuery, DecrementStock, RegisterItem, Restock,
    SaleReference, StockCommand, StockDecrement, StockItem,
};
use furnerp_pos::{InventoryService, ServiceError};

use super::service_error;
use crate::event_store::{EventStore, InMemoryEventStore};
use crate::read_model::{InMemoryTenantStore, TenantStore};
use crate::repository::AggregateRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCatalogItem {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub unit_price: Money,
    pub initial_stock: u32,
}

/// Event-sourced stock with a catalog read model.
pub struct InMemoryInventoryService {
    repo: AggregateRepository<Arc<dyn EventStore>>,
    catalog: InMemoryTenantStore<CatalogItemId, CatalogItem>,
    /// Held by every write, so checks and appends never interleave and the
    /// read model is updated in commit order.
    writes: Mutex<()>,
}

impl Default for InMemoryInventoryService {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryEventStore::new()))
    }
}

impl InMemoryInventoryService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            repo: AggregateRepository::new(store),
            catalog: InMemoryTenantStore::new(),
            writes: Mutex::new(()),
        }
    }

    pub fn register_item(
        &self,
        tenant_id: TenantId,
        item: NewCatalogItem,
    ) -> Result<CatalogItemId, ServiceError> {
        let _writes = self.lock_writes()?;
        let sku = item.sku.trim().to_string();
        if !self
            .catalog
            .query(tenant_id, &|existing: &CatalogItem| existing.sku.eq_ignore_ascii_case(&sku))
            .is_empty()
        {
            return Err(ServiceError::Conflict(format!("sku {sku} already exists")));
        }

        let item_id = CatalogItemId::new(AggregateId::new());
        let command = StockCommand::RegisterItem(RegisterItem {
            tenant_id,
            item_id,
            name: item.name,
            sku,
            category: item.category,
            unit_price: item.unit_price,
            initial_stock: item.initial_stock,
            occurred_at: Utc::now(),
        });
        self.execute(tenant_id, item_id, &command)?;
        Ok(item_id)
    }

    /// External goods receipt. Returns the new on-hand count.
    pub fn restock(
        &self,
        tenant_id: TenantId,
        item_id: CatalogItemId,
        quantity: u32,
    ) -> Result<u32, ServiceError> {
        let _writes = self.lock_writes()?;
        let command = StockCommand::Restock(Restock {
            tenant_id,
            item_id,
            quantity,
            occurred_at: Utc::now(),
        });
        self.execute(tenant_id, item_id, &command)
    }

    pub fn get_item(&self, tenant_id: TenantId, item_id: CatalogItemId) -> Option<CatalogItem> {
        self.catalog.get(tenant_id, &item_id)
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, ServiceError> {
        self.writes
            .lock()
            .map_err(|_| ServiceError::Unavailable("inventory lock poisoned".to_string()))
    }

    fn load(&self, tenant_id: TenantId, item_id: CatalogItemId) -> Result<StockItem, ServiceError> {
        self.repo
            .load(tenant_id, item_id.0, || StockItem::empty(item_id))
            .map_err(service_error)
    }

    fn execute(
        &self,
        tenant_id: TenantId,
        item_id: CatalogItemId,
        command: &StockCommand,
    ) -> Result<u32, ServiceError> {
        let executed = self
            .repo
            .execute(tenant_id, item_id.0, command, || StockItem::empty(item_id))
            .map_err(service_error)?;
        if let Some(view) = executed.aggregate.to_catalog_item() {
            self.catalog.upsert(tenant_id, item_id, view);
        }
        Ok(executed.aggregate.on_hand())
    }
}

/// Sum quantities per item, keeping first-seen order.
fn merge_lines(lines: &[StockDecrement]) -> Vec<StockDecrement> {
    let mut merged: Vec<StockDecrement> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.item_id == line.item_id) {
            Some(m) => m.quantity = m.quantity.saturating_add(line.quantity),
            None => merged.push(*line),
        }
    }
    merged
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    async fn list_catalog_items(
        &self,
        tenant_id: TenantId,
        query: &CatalogQuery,
    ) -> Result<Vec<CatalogItem>, ServiceError> {
        let mut items = self.catalog.query(tenant_id, &|item: &CatalogItem| query.matches(item));
        items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.sku.cmp(&b.sku)));
        Ok(items)
    }

    /// Every line is checked before any is applied; one bad line rejects the batch.
    async fn decrement_stock(
        &self,
        tenant_id: TenantId,
        reference: SaleReference,
        lines: &[StockDecrement],
    ) -> Result<(), ServiceError> {
        let _writes = self.lock_writes()?;

        let occurred_at = Utc::now();
        let commands: Vec<(CatalogItemId, StockCommand)> = merge_lines(lines)
            .into_iter()
            .map(|line| {
                let command = StockCommand::DecrementStock(DecrementStock {
                    tenant_id,
                    item_id: line.item_id,
                    quantity: line.quantity,
                    reference,
                    occurred_at,
                });
                (line.item_id, command)
            })
            .collect();

        for (item_id, command) in &commands {
            let item = self.load(tenant_id, *item_id)?;
            item.handle(command).map_err(|err| {
                tracing::warn!(%tenant_id, %reference, item_id = %item_id, error = %err, "stock decrement rejected");
                service_error(err.into())
            })?;
        }

        for (item_id, command) in &commands {
            self.execute(tenant_id, *item_id, command)?;
        }
        tracing::info!(%tenant_id, %reference, lines = commands.len(), "stock decremented");
        Ok(())
    }
}
