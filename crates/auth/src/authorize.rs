use thiserror::Error;

use crate::capability::Capability;
use crate::session::SessionContext;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing capability '{0}'")]
    Forbidden(Capability),
}

/// Check that the session holds `required`.
///
/// Pure policy check: no IO, no panics.
pub fn authorize(session: &SessionContext, required: Capability) -> Result<(), AuthzError> {
    if session.capabilities().allows(required) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %session.user_id(),
            tenant_id = %session.tenant_id(),
            capability = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden(required))
    }
}
