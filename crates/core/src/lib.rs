//! `furnerp-core` — domain foundation building blocks.
//!
//! Pure domain primitives shared by every other crate (no IO).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};
pub use money::{Money, TaxRate};
pub use value_object::ValueObject;
