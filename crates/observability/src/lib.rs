//! Process-wide logging setup.

pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat};

/// Initialize logging with JSON output filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    crate::tracing::init(&LogConfig::default());
}

/// Initialize logging from explicit configuration.
pub fn init_with(config: &LogConfig) {
    crate::tracing::init(config);
}
