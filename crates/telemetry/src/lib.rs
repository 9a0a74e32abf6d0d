//! Logging and tracing bootstrap.

use tracing_subscriber::EnvFilter;

use lectern_kernel::settings::{LogFormat, TelemetrySettings};

/// Initialize the tracing/logging pipeline.
///
/// `RUST_LOG` overrides the default `info` filter. Safe to call more than
/// once; later calls are no-ops.
pub fn init(settings: &TelemetrySettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if result.is_err() {
        tracing::debug!(target: "lectern-telemetry", "tracing subscriber already installed");
    }
}
