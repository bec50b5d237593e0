pub mod config;
pub mod export;
pub mod ingest;

/// Installs the `tracing` subscriber used by the binaries: `RUST_LOG` when
/// set, `info` otherwise, with file and line numbers.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_file(true).with_line_number(true);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
