//! `bodega-observability` — process-wide tracing setup.
//!
//! The store and its hosts emit structured events through [`tracing`]; this
//! crate owns the subscriber wiring so every binary and test harness
//! configures logs the same way.

use tracing_subscriber::EnvFilter;

/// Initialize JSON logging for the process, honoring `RUST_LOG`.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() {
    init_with_default("info");
}

/// Like [`init`], but with an explicit fallback directive for when
/// `RUST_LOG` is unset. Test harnesses use this to quiet noisy targets.
pub fn init_with_default(directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
