use serde::{Deserialize, Serialize};

use furnerp_core::{AggregateId, Entity, Money};

/// Catalog item identifier (one stock stream per item).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogItemId(pub AggregateId);

impl CatalogItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CatalogItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A sellable item with its current on-hand count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub unit_price: Money,
    pub on_hand: u32,
}

impl CatalogItem {
    pub fn is_in_stock(&self) -> bool {
        self.on_hand > 0
    }

    /// Case-insensitive substring match on name or SKU. `needle` must already
    /// be lowercase; an empty needle matches everything.
    pub fn matches_text(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.sku.to_lowercase().contains(needle)
    }
}

impl Entity for CatalogItem {
    type Id = CatalogItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Filter for catalog listings, evaluated by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub text: Option<String>,
    pub in_stock_only: bool,
}

impl CatalogQuery {
    /// Every sellable item.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn containing(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn in_stock(mut self) -> Self {
        self.in_stock_only = true;
        self
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        if self.in_stock_only && !item.is_in_stock() {
            return false;
        }
        if let Some(category) = &self.category {
            if !item.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        match &self.text {
            Some(text) => item.matches_text(&text.trim().to_lowercase()),
            None => true,
        }
    }
}

/// One line of a batched stock decrement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecrement {
    pub item_id: CatalogItemId,
    pub quantity: u32,
}
