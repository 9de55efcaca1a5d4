//! `tracing` setup and the bridge that routes SDK messages into it.

use nvtrt::{LogHandler, Severity};
use tracing_subscriber::EnvFilter;

/// Default filter for a `-v` count: info, then debug, then trace.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber, logging to stderr. `RUST_LOG` takes
/// precedence over `verbosity`.
///
/// Calling this more than once keeps the first subscriber.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Forwards SDK log messages to `tracing` under the `tensorrt` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl LogHandler for TracingLogger {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::InternalError | Severity::Error => {
                tracing::error!(target: "tensorrt", "{message}")
            }
            Severity::Warning => tracing::warn!(target: "tensorrt", "{message}"),
            Severity::Info => tracing::info!(target: "tensorrt", "{message}"),
            Severity::Verbose => tracing::debug!(target: "tensorrt", "{message}"),
        }
    }
}
