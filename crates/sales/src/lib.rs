//! Sales Orders domain module (event-sourced).
//!
//! Business rules for orders as deterministic domain logic (no IO, no storage).

pub mod order;

pub use order::{
    ChangeStatus, OrderLine, OrderPlaced, OrderStatus, PaymentMethod, PlaceOrder, SalesOrder,
    SalesOrderCommand, SalesOrderEvent, SalesOrderId, StatusChanged,
};
