//! Logger initialisation for the binaries
//!
//! The library crates log through the `log` facade. The subscriber installed
//! here picks those records up through its `log` bridge, so `RUST_LOG`
//! filters both.

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber
///
/// `verbose` raises the default level to `debug`. A second call is a no-op.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
