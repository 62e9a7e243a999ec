//! One cashier's point-of-sale terminal.

use thiserror::Error;

use furnerp_auth::{authorize, AuthzError, Capability, SessionContext};
use furnerp_core::TaxRate;
use furnerp_inventory::CatalogItemId;
use furnerp_sales::PaymentMethod;

use crate::cart::{Cart, CartChange, CartWarning, WALK_IN_CUSTOMER};
use crate::catalog::{CatalogCache, CatalogSearch, LoadError};
use crate::checkout::{
    CheckoutError, CheckoutOrchestrator, CheckoutState, PendingSale, UnreconciledSale,
};
use crate::hold::{HeldCart, HoldError, HoldStack};
use crate::ports::{CustomerDirectory, InventoryService, OrderService, PrintError, ReceiptPrinter};
use crate::receipt::{ReceiptLayout, ReceiptRenderer, SaleReceipt};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TerminalError {
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Cart(#[from] CartWarning),

    #[error(transparent)]
    Hold(#[from] HoldError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("no item with SKU '{0}'")]
    UnknownSku(String),

    #[error("item {0} is not in the catalog")]
    UnknownItem(CatalogItemId),

    #[error("the receipt is open; start a new sale first")]
    ReceiptOpen,

    #[error("no receipt to show")]
    NoReceipt,

    #[error(transparent)]
    Print(#[from] PrintError),
}

impl TerminalError {
    /// Local rejections shown as warnings; nothing was applied and nothing failed.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            TerminalError::Cart(_)
                | TerminalError::Hold(_)
                | TerminalError::UnknownSku(_)
                | TerminalError::UnknownItem(_)
                | TerminalError::ReceiptOpen
                | TerminalError::Checkout(CheckoutError::EmptyCart)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSettings {
    pub tax_rate: TaxRate,
    pub walk_in_customer: String,
    pub receipt: ReceiptLayout,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            tax_rate: TaxRate::STANDARD,
            walk_in_customer: WALK_IN_CUSTOMER.to_string(),
            receipt: ReceiptLayout::default(),
        }
    }
}

/// Terminal state for one session: catalog, active cart, held carts, checkout.
///
/// Every operation takes `&mut self`, so one terminal runs one checkout at a time.
pub struct PosTerminal<I, C, O> {
    session: SessionContext,
    inventory: I,
    customers: C,
    orders: O,
    settings: TerminalSettings,
    catalog: CatalogCache,
    cart: Cart,
    held: HoldStack,
    checkout: CheckoutOrchestrator,
    renderer: ReceiptRenderer,
}

impl<I, C, O> PosTerminal<I, C, O>
where
    I: InventoryService,
    C: CustomerDirectory,
    O: OrderService,
{
    /// Open a terminal for `session`. Requires `pos.access`.
    pub fn new(
        session: SessionContext,
        settings: TerminalSettings,
        inventory: I,
        customers: C,
        orders: O,
    ) -> Result<Self, TerminalError> {
        authorize(&session, Capability::PosAccess)?;
        Ok(Self {
            cart: Self::fresh_cart(&settings),
            renderer: ReceiptRenderer::new(settings.receipt.clone()),
            session,
            inventory,
            customers,
            orders,
            settings,
            catalog: CatalogCache::new(),
            held: HoldStack::new(),
            checkout: CheckoutOrchestrator::new(),
        })
    }

    fn fresh_cart(settings: &TerminalSettings) -> Cart {
        Cart::with_default_customer(settings.tax_rate, settings.walk_in_customer.clone())
    }

    /// Load items and customer names. Returns the number of items loaded.
    #[tracing::instrument(skip(self), fields(tenant_id = %self.session.tenant_id()))]
    pub async fn load(&mut self) -> Result<usize, TerminalError> {
        authorize(&self.session, Capability::PosAccess)?;
        match self
            .catalog
            .load(self.session.tenant_id(), &self.inventory, &self.customers)
            .await
        {
            Ok(count) => {
                tracing::info!(
                    items = count,
                    customers = self.catalog.customers().len(),
                    "catalog loaded"
                );
                Ok(count)
            }
            Err(err) => {
                tracing::error!(error = %err, "catalog load failed");
                Err(err.into())
            }
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn settings(&self) -> &TerminalSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn held(&self) -> &[HeldCart] {
        self.held.held()
    }

    pub fn checkout_state(&self) -> &CheckoutState {
        self.checkout.state()
    }

    pub fn search(&self, query: &str) -> CatalogSearch<'_> {
        self.catalog.search(query)
    }

    /// Barcode path: look the SKU up in the catalog and add one unit.
    pub fn scan(&mut self, sku: &str) -> Result<CartChange, TerminalError> {
        self.ensure_editable()?;
        let item = self
            .catalog
            .find_by_sku(sku)
            .ok_or_else(|| TerminalError::UnknownSku(sku.trim().to_string()))?;
        let change = self.cart.add(item).inspect_err(|warning| {
            tracing::warn!(sku = %item.sku, %warning, "item not added");
        })?;
        tracing::debug!(sku = %item.sku, ?change, "item scanned");
        Ok(change)
    }

    pub fn add_item(&mut self, item_id: CatalogItemId) -> Result<CartChange, TerminalError> {
        self.ensure_editable()?;
        let item = self
            .catalog
            .get(item_id)
            .ok_or(TerminalError::UnknownItem(item_id))?;
        let change = self.cart.add(item).inspect_err(|warning| {
            tracing::warn!(sku = %item.sku, %warning, "item not added");
        })?;
        tracing::debug!(sku = %item.sku, ?change, "item added");
        Ok(change)
    }

    pub fn adjust_quantity(
        &mut self,
        item_id: CatalogItemId,
        delta: i64,
    ) -> Result<CartChange, TerminalError> {
        self.ensure_editable()?;
        let change = self.cart.adjust_quantity(item_id, delta)?;
        tracing::debug!(%item_id, delta, ?change, "quantity adjusted");
        Ok(change)
    }

    pub fn remove_item(&mut self, item_id: CatalogItemId) -> Result<(), TerminalError> {
        self.ensure_editable()?;
        if self.cart.remove(item_id) {
            Ok(())
        } else {
            Err(CartWarning::NotInCart(item_id).into())
        }
    }

    pub fn clear_cart(&mut self) -> Result<(), TerminalError> {
        self.ensure_editable()?;
        self.cart.clear();
        Ok(())
    }

    pub fn set_customer(&mut self, label: &str) -> Result<(), TerminalError> {
        self.ensure_editable()?;
        self.cart.set_customer(label);
        Ok(())
    }

    pub fn hold_cart(&mut self) -> Result<usize, TerminalError> {
        self.ensure_editable()?;
        let index = self.held.hold(&mut self.cart)?;
        tracing::debug!(index, held = self.held.len(), "cart held");
        Ok(index)
    }

    pub fn resume_held(&mut self, index: usize) -> Result<(), TerminalError> {
        self.ensure_editable()?;
        self.held.resume(index, &mut self.cart)?;
        Ok(())
    }

    pub fn discard_held(&mut self, index: usize) -> Result<Cart, TerminalError> {
        Ok(self.held.discard(index)?)
    }

    /// Check out the active cart. The cart stays as it is until
    /// [`start_new_sale`](Self::start_new_sale).
    pub async fn checkout(
        &mut self,
        payment_method: PaymentMethod,
    ) -> Result<SaleReceipt, TerminalError> {
        let receipt = self
            .checkout
            .submit(
                &self.session,
                &self.cart,
                &mut self.catalog,
                payment_method,
                &self.inventory,
                &self.orders,
            )
            .await?;
        Ok(receipt)
    }

    pub fn receipt(&self) -> Option<&SaleReceipt> {
        self.checkout.receipt()
    }

    pub fn render_receipt(&self) -> Result<String, TerminalError> {
        let receipt = self.receipt().ok_or(TerminalError::NoReceipt)?;
        Ok(self.renderer.render(receipt))
    }

    pub fn print_receipt<P>(&self, printer: &P) -> Result<(), TerminalError>
    where
        P: ReceiptPrinter + ?Sized,
    {
        let rendered = self.render_receipt()?;
        printer.print(&rendered)?;
        Ok(())
    }

    /// Dismiss the receipt and start over with an empty cart.
    pub fn start_new_sale(&mut self) -> Result<SaleReceipt, TerminalError> {
        let receipt = self.checkout.dismiss().ok_or(TerminalError::NoReceipt)?;
        self.cart.clear();
        Ok(receipt)
    }

    pub fn pending_sale(&self) -> Option<&PendingSale> {
        self.checkout.pending_sale()
    }

    pub fn unreconciled_sales(&self) -> &[UnreconciledSale] {
        self.checkout.unreconciled()
    }

    pub fn take_unreconciled_sales(&mut self) -> Vec<UnreconciledSale> {
        self.checkout.take_unreconciled()
    }

    fn ensure_editable(&self) -> Result<(), TerminalError> {
        if self.checkout.receipt().is_some() {
            return Err(TerminalError::ReceiptOpen);
        }
        Ok(())
    }
}
