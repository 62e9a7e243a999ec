//! Catalog cache: the terminal's local, possibly stale, copy of sellable items.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use furnerp_core::{Entity, TenantId};
use furnerp_inventory::{CatalogItem, CatalogItemId, CatalogQuery, StockDecrement};

use crate::ports::{CustomerDirectory, InventoryService, ServiceError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[source] ServiceError),

    #[error("failed to load customers: {0}")]
    Customers(#[source] ServiceError),
}

#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    items: Vec<CatalogItem>,
    customers: Vec<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache seeded without going through the services.
    pub fn from_parts(items: Vec<CatalogItem>, customers: Vec<String>) -> Self {
        Self {
            items,
            customers,
            loaded_at: Some(Utc::now()),
        }
    }

    /// Fetch items and customer names concurrently and replace the cache.
    ///
    /// If either fetch fails the cache is left empty.
    pub async fn load<I, C>(
        &mut self,
        tenant_id: TenantId,
        inventory: &I,
        customers: &C,
    ) -> Result<usize, LoadError>
    where
        I: InventoryService + ?Sized,
        C: CustomerDirectory + ?Sized,
    {
        let query = CatalogQuery::all();
        let fetched = tokio::try_join!(
            async {
                inventory
                    .list_catalog_items(tenant_id, &query)
                    .await
                    .map_err(LoadError::Catalog)
            },
            async {
                customers
                    .list_customer_names(tenant_id)
                    .await
                    .map_err(LoadError::Customers)
            },
        );

        match fetched {
            Ok((items, names)) => {
                self.items = items;
                self.customers = names;
                self.loaded_at = Some(Utc::now());
                Ok(self.items.len())
            }
            Err(err) => {
                self.items.clear();
                self.customers.clear();
                self.loaded_at = None;
                Err(err)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn customers(&self) -> &[String] {
        &self.customers
    }

    pub fn get(&self, item_id: CatalogItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|i| *Entity::id(*i) == item_id)
    }

    /// Exact SKU lookup for the barcode path (case-insensitive, trimmed).
    pub fn find_by_sku(&self, sku: &str) -> Option<&CatalogItem> {
        let sku = sku.trim();
        self.items.iter().find(|i| i.sku.eq_ignore_ascii_case(sku))
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.items
            .iter()
            .map(|i| i.category.as_str())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Lazy filter over name/SKU. Clone the iterator to restart it.
    pub fn search(&self, query: &str) -> CatalogSearch<'_> {
        CatalogSearch {
            items: self.items.iter(),
            needle: query.trim().to_lowercase(),
        }
    }

    /// Subtract sold quantities from the cached counts (local patch only).
    pub fn apply_sale(&mut self, sold: &[StockDecrement]) {
        for line in sold {
            if let Some(item) = self.items.iter_mut().find(|i| i.id == line.item_id) {
                item.on_hand = item.on_hand.saturating_sub(line.quantity);
            }
        }
    }
}

/// Iterator returned by [`CatalogCache::search`].
#[derive(Debug, Clone)]
pub struct CatalogSearch<'a> {
    items: core::slice::Iter<'a, CatalogItem>,
    needle: String,
}

impl<'a> Iterator for CatalogSearch<'a> {
    type Item = &'a CatalogItem;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = self.needle.as_str();
        self.items.by_ref().find(|item| item.matches_text(needle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.items.len()))
    }
}
