//! Inventory domain module (event-sourced stock per catalog item).
//!
//! Pure domain logic: no IO, no storage.

pub mod catalog;
pub mod item;

pub use catalog::{CatalogItem, CatalogItemId, CatalogQuery, StockDecrement};
pub use item::{
    DecrementStock, ItemRegistered, RegisterItem, Restock, SaleReference, StockCommand,
    StockDecremented, StockEvent, StockItem, StockRestocked,
};
