//! Infrastructure: event store, aggregate repository, read models, in-memory
//! service adapters and configuration.

pub mod config;
pub mod event_store;
pub mod read_model;
pub mod repository;
pub mod services;

pub use config::{ConfigError, PosConfig};
pub use repository::{AggregateRepository, Executed, RepositoryError};
pub use services::{
    InMemoryCustomerDirectory, InMemoryInventoryService, InMemoryOrderService, NewCatalogItem,
};
