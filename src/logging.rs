//! Tracing setup for both adapters.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Diagnostics go to stderr so the
/// terminal transcript on stdout stays clean; verbosity comes from
/// `RUST_LOG` and defaults to warnings only.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
