//! Tracing subscriber setup for binaries

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a `fmt` subscriber filtered by `RUST_LOG`, or by `default_directive` when unset
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .is_ok()
}
