//! Tracing setup
//!
//! The library only emits `tracing` events. Embedding binaries call
//! [`init_tracing`] once to get formatted output.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Default filter used when the settings do not name one
pub const DEFAULT_LOG_FILTER: &str = "ledger_core=info";

/// Initializes the global tracing subscriber
///
/// `RUST_LOG` wins over `filter` when set. Later calls are no-ops, and an
/// already-installed global subscriber is left in place.
pub fn init_tracing(filter: &str) {
    TRACING_INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = fmt().with_env_filter(env_filter).try_init();
    });
}
