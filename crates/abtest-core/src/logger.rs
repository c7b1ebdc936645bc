//! Default log sink for applications that do not install their own.
//!
//! The SDK only emits `tracing` events. Call [`init_default_logger`] once at
//! startup to get them on stderr.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_FILTER: &str = "info";

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns false and changes nothing if a global subscriber is already set.
pub fn init_default_logger() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "Global subscriber already installed");
            false
        },
    }
}
