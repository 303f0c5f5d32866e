//! Tracing subscriber setup for hosts and tests.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a fmt subscriber with an env-filter.
///
/// `debug` raises the default level from `info` to `debug`; `RUST_LOG` still
/// overrides either. Safe to call more than once — later calls are no-ops.
pub fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .try_init();
}
