//! Tenant-isolated read models rebuilt from aggregate state.

pub mod tenant_store;

pub use tenant_store::{InMemoryTenantStore, TenantStore};
