//! Process-wide tracing setup shared by the agora binaries.

/// Initialize tracing with the default settings (JSON, `RUST_LOG`, `info`).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    init_with(&LogConfig::default());
}

/// Initialize tracing with explicit settings.
pub fn init_with(config: &LogConfig) {
    tracing::init(config);
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use tracing::{LogConfig, LogFormat};
