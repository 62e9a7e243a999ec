//! Parked carts.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cart::Cart;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HoldError {
    #[error("nothing to hold: the cart is empty")]
    EmptyCart,

    #[error("no held cart at position {index} ({len} held)")]
    NoSuchCart { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldCart {
    pub cart: Cart,
    pub held_at: DateTime<Utc>,
}

/// Held carts in insertion order. Any entry can be resumed, not just the last.
#[derive(Debug, Clone, Default)]
pub struct HoldStack {
    held: Vec<HeldCart>,
}

impl HoldStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self) -> &[HeldCart] {
        &self.held
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Park a copy of `active` and clear it. Returns the new entry's position.
    pub fn hold(&mut self, active: &mut Cart) -> Result<usize, HoldError> {
        if active.is_empty() {
            return Err(HoldError::EmptyCart);
        }
        self.held.push(HeldCart {
            cart: active.clone(),
            held_at: Utc::now(),
        });
        active.clear();
        Ok(self.held.len() - 1)
    }

    /// Replace `active` with the held cart at `index`.
    ///
    /// Whatever was active is discarded; hold it first to keep it.
    pub fn resume(&mut self, index: usize, active: &mut Cart) -> Result<(), HoldError> {
        self.check(index)?;
        *active = self.held.remove(index).cart;
        Ok(())
    }

    /// Drop the held cart at `index` without resuming it.
    pub fn discard(&mut self, index: usize) -> Result<Cart, HoldError> {
        self.check(index)?;
        Ok(self.held.remove(index).cart)
    }

    fn check(&self, index: usize) -> Result<(), HoldError> {
        if index >= self.held.len() {
            return Err(HoldError::NoSuchCart {
                index,
                len: self.held.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furnerp_core::{AggregateId, Money};
    use furnerp_inventory::{CatalogItem, CatalogItemId};
    use proptest::prelude::*;

    fn item(on_hand: u32, price: u64) -> CatalogItem {
        CatalogItem {
            id: CatalogItemId::new(AggregateId::new()),
            name: format!("Item {price}"),
            sku: format!("SKU-{price}"),
            category: String::new(),
            unit_price: Money::from_minor(price),
            on_hand,
        }
    }

    fn cart_with(items: &[(u32, u64)], customer: &str) -> Cart {
        let mut cart = Cart::default();
        cart.set_customer(customer);
        for (on_hand, price) in items {
            let it = item(*on_hand, *price);
            for _ in 0..*on_hand {
                cart.add(&it).unwrap();
            }
        }
        cart
    }

    #[test]
    fn hold_clears_active_cart() {
        let mut holds = HoldStack::new();
        let mut active = cart_with(&[(2, 100)], "Rina");

        assert_eq!(holds.hold(&mut active), Ok(0));
        assert!(active.is_empty());
        assert_eq!(holds.len(), 1);
        assert_eq!(holds.held()[0].cart.customer(), "Rina");
    }

    #[test]
    fn empty_cart_cannot_be_held() {
        let mut holds = HoldStack::new();
        let mut active = Cart::default();
        assert_eq!(holds.hold(&mut active), Err(HoldError::EmptyCart));
        assert!(holds.is_empty());
    }

    #[test]
    fn resume_any_position_discards_active() {
        let mut holds = HoldStack::new();
        let mut first = cart_with(&[(1, 100)], "First");
        let mut second = cart_with(&[(1, 200)], "Second");
        let second_copy = second.clone();
        holds.hold(&mut first).unwrap();
        holds.hold(&mut second).unwrap();

        let mut active = cart_with(&[(1, 300)], "Current");
        holds.resume(1, &mut active).unwrap();

        assert_eq!(active, second_copy);
        assert_eq!(holds.len(), 1);
        assert_eq!(holds.held()[0].cart.customer(), "First");
    }

    #[test]
    fn out_of_range_is_reported() {
        let mut holds = HoldStack::new();
        let mut active = Cart::default();
        assert_eq!(
            holds.resume(0, &mut active),
            Err(HoldError::NoSuchCart { index: 0, len: 0 })
        );
        assert_eq!(holds.discard(3), Err(HoldError::NoSuchCart { index: 3, len: 0 }));
    }

    #[test]
    fn discard_returns_the_cart() {
        let mut holds = HoldStack::new();
        let mut active = cart_with(&[(3, 100)], "Dewi");
        holds.hold(&mut active).unwrap();

        let dropped = holds.discard(0).unwrap();
        assert_eq!(dropped.unit_count(), 3);
        assert!(holds.is_empty());
    }

    proptest! {
        /// Property: hold followed by resume(0) restores an identical cart.
        #[test]
        fn hold_then_resume_round_trips(
            lines in prop::collection::vec((1u32..4, 1u64..100_000), 1..5),
            customer in "[A-Za-z ]{0,12}"
        ) {
            let mut holds = HoldStack::new();
            let mut active = cart_with(&lines, &customer);
            let original = active.clone();

            holds.hold(&mut active).unwrap();
            holds.resume(0, &mut active).unwrap();

            prop_assert_eq!(active, original);
            prop_assert!(holds.is_empty());
        }
    }
}
