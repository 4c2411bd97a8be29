//! Structured logging for netprobe
//!
//! This module sets up tracing-based logging with configurable levels.
//! Output goes to stderr so stdout stays reserved for results and the
//! `--json` event stream.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system
///
/// This sets up tracing with:
/// - Environment-based filtering via RUST_LOG env var
/// - Default level of INFO in release builds, DEBUG in debug builds
/// - `verbose` forces debug output for netprobe itself
///
/// # Example
/// ```ignore
/// use netprobe_lib::logging;
/// logging::init(false);
/// tracing::info!("Application started");
/// ```
pub fn init(verbose: bool) {
    let default_level = if verbose || cfg!(debug_assertions) {
        "netprobe=debug,netprobe_lib=debug,info"
    } else {
        "netprobe=info,netprobe_lib=info,warn"
    };

    // Allow override via RUST_LOG environment variable
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .compact(),
        )
        .try_init();
}

/// Initialize logging for tests
///
/// Similar to `init()` but with a test-friendly configuration.
/// Uses try_init() to avoid panicking if called multiple times.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

/// Macro for creating a span with common fields
///
/// Used around a probe run so every log line carries the session id.
#[macro_export]
macro_rules! operation_span {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
