//! Point-of-sale flow: catalog cache, cart, held carts, checkout and receipts.
//!
//! External systems are reached only through the traits in [`ports`].

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod hold;
pub mod ports;
pub mod receipt;
pub mod terminal;

pub use cart::{Cart, CartChange, CartLine, CartWarning, WALK_IN_CUSTOMER};
pub use catalog::{CatalogCache, CatalogSearch, LoadError};
pub use checkout::{
    CheckoutError, CheckoutOrchestrator, CheckoutState, OrderWrite, PendingSale, UnreconciledSale,
};
pub use hold::{HeldCart, HoldError, HoldStack};
pub use ports::{
    CustomerDirectory, InventoryService, NewOrder, OrderService, PrintError, ReceiptPrinter,
    ServiceError,
};
pub use receipt::{ReceiptLayout, ReceiptLine, ReceiptRenderer, SaleReceipt};
pub use terminal::{PosTerminal, TerminalError, TerminalSettings};
