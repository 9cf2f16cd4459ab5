use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global JSON subscriber on stderr.
///
/// An unparsable `level` falls back to `info`. Fails when a global subscriber
/// is already installed (tests, embedding applications).
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
