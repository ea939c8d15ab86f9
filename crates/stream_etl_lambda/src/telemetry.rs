//! JSON log setup shared by the Lambda binaries.

use stream_etl_core::config::LogLevel;
use tracing_subscriber::EnvFilter;

/// Installs a JSON `tracing` subscriber filtered at `level`. Lambda ships
/// stdout to CloudWatch, so ANSI colours and targets are disabled.
pub fn init_tracing(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(level.as_directive()))
        .with_ansi(false)
        .with_target(false)
        .with_current_span(false)
        .try_init();
}
