pub mod build_info;

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Installs the global subscriber on stderr. Returns `true` for the call that
/// installed it.
pub fn init_tracing(default_directive: &str) -> bool {
    let mut installed = false;
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directive))
            .unwrap_or_else(|_| EnvFilter::new(crate::DEFAULT_LOG_FILTER));

        installed = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok();
    });
    installed
}
