//! The active cart: lines unique by item, quantities bounded by stock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use furnerp_core::{Money, TaxRate};
use furnerp_inventory::{CatalogItem, CatalogItemId, StockDecrement};
use furnerp_sales::OrderLine;

/// Customer label used when the cashier has not picked anyone.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Rejected cart operation. The cart is unchanged when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartWarning {
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    #[error("only {available} of {name} in stock")]
    StockLimit { name: String, available: u32 },

    #[error("item {0} is not in the cart")]
    NotInCart(CatalogItemId),
}

/// What an accepted cart operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    Added,
    Incremented { quantity: u32 },
    Updated { quantity: u32 },
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog snapshot taken when the line was last added to.
    pub item: CatalogItem,
    pub quantity: u32,
}

impl CartLine {
    pub fn item_id(&self) -> CatalogItemId {
        self.item.id
    }

    pub fn line_total(&self) -> Money {
        self.item.unit_price.times(self.quantity)
    }

    /// Order-line snapshot (description, quantity, unit price).
    pub fn to_order_line(&self) -> OrderLine {
        OrderLine {
            description: self.item.name.clone(),
            quantity: self.quantity,
            unit_price: self.item.unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    customer: String,
    default_customer: String,
    tax_rate: TaxRate,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new(TaxRate::STANDARD)
    }
}

impl Cart {
    pub fn new(tax_rate: TaxRate) -> Self {
        Self::with_default_customer(tax_rate, WALK_IN_CUSTOMER)
    }

    pub fn with_default_customer(tax_rate: TaxRate, default_customer: impl Into<String>) -> Self {
        let default_customer = default_customer.into();
        Self {
            lines: Vec::new(),
            customer: default_customer.clone(),
            default_customer,
            tax_rate,
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Blank labels fall back to the default (walk-in) customer.
    pub fn set_customer(&mut self, label: &str) {
        let label = label.trim();
        self.customer = if label.is_empty() {
            self.default_customer.clone()
        } else {
            label.to_string()
        };
    }

    pub fn quantity_of(&self, item_id: CatalogItemId) -> u32 {
        self.line(item_id).map_or(0, |l| l.quantity)
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Add one unit of `item`, merging with an existing line.
    pub fn add(&mut self, item: &CatalogItem) -> Result<CartChange, CartWarning> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item.id) {
            let next = line.quantity + 1;
            if next > item.on_hand {
                return Err(CartWarning::StockLimit {
                    name: item.name.clone(),
                    available: item.on_hand,
                });
            }
            line.quantity = next;
            line.item = item.clone();
            return Ok(CartChange::Incremented { quantity: next });
        }

        if item.on_hand == 0 {
            return Err(CartWarning::OutOfStock {
                name: item.name.clone(),
            });
        }

        self.lines.push(CartLine {
            item: item.clone(),
            quantity: 1,
        });
        Ok(CartChange::Added)
    }

    /// Change a line by `delta` units. Reaching zero removes the line;
    /// exceeding the line's on-hand count is rejected.
    pub fn adjust_quantity(
        &mut self,
        item_id: CatalogItemId,
        delta: i64,
    ) -> Result<CartChange, CartWarning> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.item.id == item_id)
            .ok_or(CartWarning::NotInCart(item_id))?;

        let line = &mut self.lines[idx];
        let next = i64::from(line.quantity).saturating_add(delta);
        if next <= 0 {
            self.lines.remove(idx);
            return Ok(CartChange::Removed);
        }
        if next > i64::from(line.item.on_hand) {
            return Err(CartWarning::StockLimit {
                name: line.item.name.clone(),
                available: line.item.on_hand,
            });
        }

        // next is in 1..=on_hand, so it fits in u32.
        line.quantity = next as u32;
        Ok(CartChange::Updated {
            quantity: line.quantity,
        })
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, item_id: CatalogItemId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.item.id != item_id);
        self.lines.len() != before
    }

    /// Empty the cart and reset the customer.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer = self.default_customer.clone();
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn tax(&self) -> Money {
        self.tax_rate.of(self.subtotal())
    }

    pub fn total(&self) -> Money {
        let subtotal = self.subtotal();
        subtotal + self.tax_rate.of(subtotal)
    }

    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines.iter().map(CartLine::to_order_line).collect()
    }

    pub fn stock_decrements(&self) -> Vec<StockDecrement> {
        self.lines
            .iter()
            .map(|l| StockDecrement {
                item_id: l.item.id,
                quantity: l.quantity,
            })
            .collect()
    }

    fn line(&self, item_id: CatalogItemId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item.id == item_id)
    }
}
