//! Diagnostic tracing for solving, written to stderr so answers on stdout stay clean.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads the `RUST_LOG` env var, defaulting to `warn` if unset. Output is compact, on stderr.
///
/// # Example
/// ```bash
/// RUST_LOG=aoc_2023_toolkit=debug cargo run -- 20
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
