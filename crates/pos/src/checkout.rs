//! Checkout orchestration: persist the order, then decrement stock.
//!
//! The two writes go to different services and are not atomic. Each attempt
//! carries the order id as an idempotency key so a retry after a partial
//! failure never duplicates the order or the stock movement.

use chrono::{DateTime, Utc};
use thiserror::Error;

use furnerp_auth::{authorize, AuthzError, Capability, SessionContext};
use furnerp_core::{AggregateId, Money};
use furnerp_inventory::{SaleReference, StockDecrement};
use furnerp_sales::{OrderStatus, PaymentMethod, SalesOrderId};

use crate::cart::Cart;
use crate::catalog::CatalogCache;
use crate::ports::{InventoryService, NewOrder, OrderService, ServiceError};
use crate::receipt::SaleReceipt;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("a checkout is already in progress")]
    InProgress,

    #[error("a receipt is still open; start a new sale first")]
    ReceiptOpen,

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("payment failed: {0}")]
    OrderCreation(#[source] ServiceError),

    #[error("order {order_id} was recorded but stock was not updated: {source}")]
    StockDecrement {
        order_id: SalesOrderId,
        #[source]
        source: ServiceError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Submitting,
    ReceiptShown(SaleReceipt),
}

/// What the orchestrator knows about the order write of a pending sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderWrite {
    NotApplied,
    /// The order service failed in a way that may still have stored the order.
    Uncertain,
    Created,
}

/// A sale whose last attempt did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSale {
    pub order: NewOrder,
    pub decrements: Vec<StockDecrement>,
    pub order_write: OrderWrite,
}

impl PendingSale {
    fn from_cart(cart: &Cart, payment_method: PaymentMethod) -> Self {
        Self {
            order: NewOrder {
                order_id: SalesOrderId::new(AggregateId::new()),
                customer: cart.customer().to_string(),
                date: Utc::now(),
                lines: cart.order_lines(),
                status: OrderStatus::Delivered,
                payment_method,
                total: cart.total(),
            },
            decrements: cart.stock_decrements(),
            order_write: OrderWrite::NotApplied,
        }
    }

    fn matches(&self, cart: &Cart, payment_method: PaymentMethod) -> bool {
        self.order.customer == cart.customer()
            && self.order.payment_method == payment_method
            && self.order.total == cart.total()
            && self.order.lines == cart.order_lines()
            && self.decrements == cart.stock_decrements()
    }
}

/// An order that may exist without its stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreconciledSale {
    pub order_id: SalesOrderId,
    pub decrements: Vec<StockDecrement>,
    pub total: Money,
    /// False when the order write itself was uncertain.
    pub order_confirmed: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Resets `Submitting` to `Idle` unless the attempt finished with a receipt,
/// including when the checkout future is dropped mid-flight.
struct SubmitGuard<'a> {
    state: &'a mut CheckoutState,
}

impl<'a> SubmitGuard<'a> {
    fn enter(state: &'a mut CheckoutState) -> Self {
        *state = CheckoutState::Submitting;
        Self { state }
    }

    fn finish(self, receipt: SaleReceipt) {
        *self.state = CheckoutState::ReceiptShown(receipt);
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if *self.state == CheckoutState::Submitting {
            *self.state = CheckoutState::Idle;
        }
    }
}

#[derive(Debug, Default)]
pub struct CheckoutOrchestrator {
    state: CheckoutState,
    pending: Option<PendingSale>,
    unreconciled: Vec<UnreconciledSale>,
}

impl CheckoutOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == CheckoutState::Submitting
    }

    pub fn receipt(&self) -> Option<&SaleReceipt> {
        match &self.state {
            CheckoutState::ReceiptShown(receipt) => Some(receipt),
            _ => None,
        }
    }

    pub fn pending_sale(&self) -> Option<&PendingSale> {
        self.pending.as_ref()
    }

    pub fn unreconciled(&self) -> &[UnreconciledSale] {
        &self.unreconciled
    }

    /// Hand the unreconciled list to a reconciliation job.
    pub fn take_unreconciled(&mut self) -> Vec<UnreconciledSale> {
        std::mem::take(&mut self.unreconciled)
    }

    /// Close the receipt and return to `Idle`.
    pub fn dismiss(&mut self) -> Option<SaleReceipt> {
        match std::mem::take(&mut self.state) {
            CheckoutState::ReceiptShown(receipt) => Some(receipt),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Run one checkout attempt for `cart`.
    ///
    /// On success the sold quantities are subtracted from `catalog` and the
    /// orchestrator enters `ReceiptShown`. The cart is never modified.
    #[tracing::instrument(
        skip_all,
        fields(
            tenant_id = %session.tenant_id(),
            payment = %payment_method,
            lines = cart.lines().len()
        )
    )]
    pub async fn submit<I, O>(
        &mut self,
        session: &SessionContext,
        cart: &Cart,
        catalog: &mut CatalogCache,
        payment_method: PaymentMethod,
        inventory: &I,
        orders: &O,
    ) -> Result<SaleReceipt, CheckoutError>
    where
        I: InventoryService + ?Sized,
        O: OrderService + ?Sized,
    {
        authorize(session, Capability::PosCheckout)?;
        match self.state {
            CheckoutState::Idle => {}
            CheckoutState::Submitting => return Err(CheckoutError::InProgress),
            CheckoutState::ReceiptShown(_) => return Err(CheckoutError::ReceiptOpen),
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let Self {
            state,
            pending,
            unreconciled,
        } = self;

        let sale = match pending.take() {
            Some(previous) if previous.matches(cart, payment_method) => {
                tracing::info!(order_id = %previous.order.order_id, "retrying pending sale");
                previous
            }
            Some(stale) => {
                if stale.order_write != OrderWrite::NotApplied {
                    tracing::warn!(
                        order_id = %stale.order.order_id,
                        total = %stale.order.total,
                        "cart changed after a partial checkout; sale needs reconciliation"
                    );
                    unreconciled.push(UnreconciledSale {
                        order_id: stale.order.order_id,
                        decrements: stale.decrements,
                        total: stale.order.total,
                        order_confirmed: stale.order_write == OrderWrite::Created,
                        recorded_at: Utc::now(),
                    });
                }
                PendingSale::from_cart(cart, payment_method)
            }
            None => PendingSale::from_cart(cart, payment_method),
        };

        let guard = SubmitGuard::enter(state);
        let sale = pending.insert(sale);
        let tenant_id = session.tenant_id();

        if sale.order_write != OrderWrite::Created {
            // Stays Uncertain if this future is dropped before the service answers.
            let previous = sale.order_write;
            sale.order_write = OrderWrite::Uncertain;
            match orders.create_order(tenant_id, &sale.order).await {
                Ok(order_id) => {
                    sale.order.order_id = order_id;
                    sale.order_write = OrderWrite::Created;
                }
                Err(err) => {
                    if !err.may_have_applied() {
                        sale.order_write = previous;
                    }
                    tracing::warn!(
                        order_id = %sale.order.order_id,
                        error = %err,
                        "order creation failed"
                    );
                    return Err(CheckoutError::OrderCreation(err));
                }
            }
        }

        let order_id = sale.order.order_id;
        if let Err(err) = inventory
            .decrement_stock(tenant_id, SaleReference(order_id.0), &sale.decrements)
            .await
        {
            tracing::warn!(
                order_id = %order_id,
                error = %err,
                "stock decrement failed after order creation"
            );
            return Err(CheckoutError::StockDecrement {
                order_id,
                source: err,
            });
        }

        let decrements = std::mem::take(&mut sale.decrements);
        *pending = None;
        catalog.apply_sale(&decrements);

        let receipt = SaleReceipt::from_cart(
            cart,
            order_id,
            payment_method,
            session.display_name(),
            Utc::now(),
        );
        guard.finish(receipt.clone());

        tracing::info!(order_id = %order_id, total = %receipt.total, "sale completed");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use furnerp_auth::{CapabilitySet, Role, RolePolicy};
    use furnerp_core::{TenantId, UserId};
    use furnerp_inventory::{CatalogItem, CatalogItemId, CatalogQuery};

    #[derive(Default)]
    struct Orders {
        created: Mutex<Vec<NewOrder>>,
        failures: Mutex<VecDeque<ServiceError>>,
    }

    #[async_trait]
    impl OrderService for Orders {
        async fn create_order(
            &self,
            _tenant_id: TenantId,
            order: &NewOrder,
        ) -> Result<SalesOrderId, ServiceError> {
            if let Some(err) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            self.created.lock().unwrap().push(order.clone());
            Ok(order.order_id)
        }
    }

    #[derive(Default)]
    struct Inventory {
        calls: Mutex<Vec<(SaleReference, Vec<StockDecrement>)>>,
        failures: Mutex<VecDeque<ServiceError>>,
    }

    #[async_trait]
    impl InventoryService for Inventory {
        async fn list_catalog_items(
            &self,
            _tenant_id: TenantId,
            _query: &CatalogQuery,
        ) -> Result<Vec<CatalogItem>, ServiceError> {
            Ok(Vec::new())
        }

        async fn decrement_stock(
            &self,
            _tenant_id: TenantId,
            reference: SaleReference,
            lines: &[StockDecrement],
        ) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push((reference, lines.to_vec()));
            match self.failures.lock().unwrap().pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn cashier() -> SessionContext {
        SessionContext::new(
            TenantId::new(),
            UserId::new(),
            "Sari",
            vec![Role::CASHIER],
            &RolePolicy::standard(),
        )
    }

    fn catalog_item(name: &str, price: u64, on_hand: u32) -> CatalogItem {
        CatalogItem {
            id: CatalogItemId::new(AggregateId::new()),
            name: name.to_string(),
            sku: name.to_uppercase(),
            category: "Living".to_string(),
            unit_price: Money::from_minor(price),
            on_hand,
        }
    }

    fn setup() -> (CatalogCache, Cart) {
        let lamp = catalog_item("Lamp", 10_000, 5);
        let catalog = CatalogCache::from_parts(vec![lamp.clone()], Vec::new());
        let mut cart = Cart::default();
        cart.add(&lamp).unwrap();
        cart.add(&lamp).unwrap();
        (catalog, cart)
    }

    #[tokio::test]
    async fn successful_checkout_shows_receipt_and_patches_cache() {
        let (mut catalog, cart) = setup();
        let (orders, inventory) = (Orders::default(), Inventory::default());
        let mut checkout = CheckoutOrchestrator::new();

        let receipt = checkout
            .submit(&cashier(), &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap();

        assert_eq!(receipt.total, Money::from_minor(21_600));
        assert_eq!(checkout.receipt(), Some(&receipt));
        assert!(checkout.pending_sale().is_none());
        assert_eq!(catalog.items()[0].on_hand, 3);

        let created = orders.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].status, OrderStatus::Delivered);
        assert_eq!(created[0].order_id, receipt.order_id);

        let calls = inventory.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SaleReference(receipt.order_id.0));
    }

    #[tokio::test]
    async fn order_failure_returns_to_idle_without_touching_stock() {
        let (mut catalog, cart) = setup();
        let orders = Orders::default();
        orders
            .failures
            .lock()
            .unwrap()
            .push_back(ServiceError::Rejected("ledger closed".into()));
        let inventory = Inventory::default();
        let mut checkout = CheckoutOrchestrator::new();

        let err = checkout
            .submit(&cashier(), &cart, &mut catalog, PaymentMethod::Card, &inventory, &orders)
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("payment failed"));
        assert_eq!(checkout.state(), &CheckoutState::Idle);
        assert!(inventory.calls.lock().unwrap().is_empty());
        assert_eq!(catalog.items()[0].on_hand, 5);
    }

    #[tokio::test]
    async fn retry_after_decrement_failure_reuses_the_order() {
        let (mut catalog, cart) = setup();
        let orders = Orders::default();
        let inventory = Inventory::default();
        inventory
            .failures
            .lock()
            .unwrap()
            .push_back(ServiceError::Unavailable("timeout".into()));
        let mut checkout = CheckoutOrchestrator::new();
        let session = cashier();

        let err = checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap_err();
        let CheckoutError::StockDecrement { order_id, .. } = err else {
            panic!("expected stock decrement failure, got {err:?}");
        };
        assert_eq!(checkout.state(), &CheckoutState::Idle);
        assert_eq!(catalog.items()[0].on_hand, 5);

        let receipt = checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap();

        assert_eq!(receipt.order_id, order_id);
        assert_eq!(orders.created.lock().unwrap().len(), 1);
        let calls = inventory.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, calls[1].0);
        assert_eq!(catalog.items()[0].on_hand, 3);
        assert!(checkout.unreconciled().is_empty());
    }

    #[tokio::test]
    async fn changed_cart_after_partial_failure_is_flagged() {
        let (mut catalog, mut cart) = setup();
        let orders = Orders::default();
        let inventory = Inventory::default();
        inventory
            .failures
            .lock()
            .unwrap()
            .push_back(ServiceError::Unavailable("timeout".into()));
        let mut checkout = CheckoutOrchestrator::new();
        let session = cashier();

        let first = checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap_err();
        let CheckoutError::StockDecrement { order_id, .. } = first else {
            panic!("expected stock decrement failure");
        };

        let lamp_id = cart.lines()[0].item_id();
        cart.adjust_quantity(lamp_id, -1).unwrap();
        let receipt = checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap();

        assert_ne!(receipt.order_id, order_id);
        assert_eq!(orders.created.lock().unwrap().len(), 2);
        let flagged = checkout.take_unreconciled();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].order_id, order_id);
        assert!(flagged[0].order_confirmed);
        assert!(checkout.unreconciled().is_empty());
    }

    #[tokio::test]
    async fn rejected_order_write_is_not_flagged_when_cart_changes() {
        let (mut catalog, mut cart) = setup();
        let orders = Orders::default();
        orders
            .failures
            .lock()
            .unwrap()
            .push_back(ServiceError::Rejected("bad customer".into()));
        let inventory = Inventory::default();
        let mut checkout = CheckoutOrchestrator::new();
        let session = cashier();

        checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap_err();
        cart.set_customer("Budi");
        checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap();

        assert!(checkout.unreconciled().is_empty());
    }

    #[tokio::test]
    async fn second_submit_while_receipt_open_is_rejected() {
        let (mut catalog, cart) = setup();
        let (orders, inventory) = (Orders::default(), Inventory::default());
        let mut checkout = CheckoutOrchestrator::new();
        let session = cashier();

        checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap();
        let err = checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::ReceiptOpen);
        assert_eq!(orders.created.lock().unwrap().len(), 1);
        assert!(checkout.dismiss().is_some());
        assert_eq!(checkout.state(), &CheckoutState::Idle);
        assert!(checkout.dismiss().is_none());
    }

    #[tokio::test]
    async fn empty_cart_and_missing_capability_are_rejected() {
        let (mut catalog, _) = setup();
        let (orders, inventory) = (Orders::default(), Inventory::default());
        let mut checkout = CheckoutOrchestrator::new();

        let err = checkout
            .submit(&cashier(), &Cart::default(), &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);

        let (_, cart) = setup();
        let viewer = SessionContext::with_capabilities(
            TenantId::new(),
            UserId::new(),
            "Viewer",
            CapabilitySet::of(&[Capability::PosAccess]),
        );
        let err = checkout
            .submit(&viewer, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::Forbidden(AuthzError::Forbidden(Capability::PosCheckout)));
        assert!(orders.created.lock().unwrap().is_empty());
    }

    struct StalledOrders;

    #[async_trait]
    impl OrderService for StalledOrders {
        async fn create_order(
            &self,
            _tenant_id: TenantId,
            _order: &NewOrder,
        ) -> Result<SalesOrderId, ServiceError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn dropped_submission_does_not_stay_submitting() {
        let (mut catalog, cart) = setup();
        let inventory = Inventory::default();
        let mut checkout = CheckoutOrchestrator::new();
        let session = cashier();

        let attempt = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            checkout.submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &StalledOrders),
        )
        .await;

        assert!(attempt.is_err());
        assert_eq!(checkout.state(), &CheckoutState::Idle);
        assert!(checkout.pending_sale().is_some());
    }

    /// Records the order, then never answers.
    #[derive(Default)]
    struct RecordingStalledOrders {
        created: Mutex<Vec<NewOrder>>,
    }

    #[async_trait]
    impl OrderService for RecordingStalledOrders {
        async fn create_order(
            &self,
            _tenant_id: TenantId,
            order: &NewOrder,
        ) -> Result<SalesOrderId, ServiceError> {
            self.created.lock().unwrap().push(order.clone());
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn order_written_by_a_dropped_submission_is_flagged_when_the_cart_changes() {
        let (mut catalog, mut cart) = setup();
        let inventory = Inventory::default();
        let stalled = RecordingStalledOrders::default();
        let mut checkout = CheckoutOrchestrator::new();
        let session = cashier();

        let attempt = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            checkout.submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &stalled),
        )
        .await;
        assert!(attempt.is_err());

        let written = stalled.created.lock().unwrap()[0].order_id;
        let pending = checkout.pending_sale().unwrap();
        assert_eq!(pending.order.order_id, written);
        assert_eq!(pending.order_write, OrderWrite::Uncertain);

        let lamp_id = cart.lines()[0].item_id();
        cart.adjust_quantity(lamp_id, -1).unwrap();

        let orders = Orders::default();
        let receipt = checkout
            .submit(&session, &cart, &mut catalog, PaymentMethod::Cash, &inventory, &orders)
            .await
            .unwrap();

        assert_ne!(receipt.order_id, written);
        let flagged = checkout.unreconciled();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].order_id, written);
        assert!(!flagged[0].order_confirmed);
    }
}
