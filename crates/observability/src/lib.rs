//! Process-wide logging setup.

pub mod logging;

pub use logging::{LogFormat, LoggingConfig};

/// Install the global subscriber from `RUST_LOG` and `LOG_FORMAT`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    logging::init(&LoggingConfig::from_env());
}
