//! Tracing setup helpers.
//!
//! The crate itself only *emits* `tracing` events; installing a subscriber is
//! the host application's call. [`init_tracing`] is the standard setup for
//! binaries, examples, and tests that want console output: an env-filtered
//! fmt subscriber honoring `RUST_LOG` (defaulting to `info`).

use tracing_subscriber::EnvFilter;

/// Install an env-filtered fmt subscriber for the whole process.
///
/// Safe to call more than once: later calls are no-ops because a global
/// subscriber can only be set once.
///
/// # Examples
///
/// ```rust
/// tributary::telemetry::init_tracing();
/// tracing::info!("loader starting");
/// ```
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
