//! Tracing setup for host applications.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show every cart operation
/// - `RUST_LOG=routecart_session=trace` - Trace for this crate only
/// - Default: INFO level
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing() -> bool {
    init_tracing_with("info")
}

/// Same as [`init_tracing`] with a custom fallback filter, used when
/// `RUST_LOG` is not set.
pub fn init_tracing_with(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
