//! `furnerp-auth` — session context and capability-based authorization.
//!
//! Decoupled from the identity provider and from storage: callers build a
//! [`SessionContext`] once and pass it explicitly.

pub mod authorize;
pub mod capability;
pub mod menu;
pub mod roles;
pub mod session;

pub use authorize::{AuthzError, authorize};
pub use capability::{Capability, CapabilitySet};
pub use menu::{ErpModule, visible_modules};
pub use roles::{Role, RolePolicy};
pub use session::SessionContext;
