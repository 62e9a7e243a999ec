//! In-memory adapters for the point-of-sale service ports.
//!
//! Writes go through event-sourced aggregates; reads come from tenant read
//! models refreshed after every successful command.

pub mod customers;
pub mod inventory;
pub mod orders;

use furnerp_core::DomainError;
use furnerp_pos::ServiceError;

use crate::repository::RepositoryError;

pub use customers::InMemoryCustomerDirectory;
pub use inventory::{InMemoryInventoryService, NewCatalogItem};
pub use orders::InMemoryOrderService;

pub(crate) fn service_error(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Domain(DomainError::NotFound) => ServiceError::NotFound(err.to_string()),
        RepositoryError::Domain(DomainError::Conflict(msg)) | RepositoryError::Concurrency(msg) => {
            ServiceError::Conflict(msg)
        }
        RepositoryError::Domain(other) => ServiceError::Rejected(other.to_string()),
        RepositoryError::TenantIsolation(_) | RepositoryError::Store(_) => {
            ServiceError::Unavailable(err.to_string())
        }
    }
}
