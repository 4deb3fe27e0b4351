//! Tracing setup for test binaries

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "image_test=info,command_executor=info";

static INIT: Once = Once::new();

/// Install a fmt subscriber writing through the test harness
///
/// Safe to call from every test; only the first call has an effect, and an
/// already-installed global subscriber is left alone.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}
