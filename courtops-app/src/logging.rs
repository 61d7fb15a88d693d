//! Diagnostics via `RUST_LOG`, written to stderr so stdout stays machine readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,courtops=info";

/// Initialize the tracing subscriber. Defaults to `warn,courtops=info`.
///
/// ```bash
/// RUST_LOG=courtops_runtime=debug courtops run --preset daily_ops_demo
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
