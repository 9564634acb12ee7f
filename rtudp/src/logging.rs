use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber for binaries and examples
/// embedding this crate. Tests should prefer [`test_subscriber`], which
/// scopes logging to the current test instead of process-wide.
///
/// Mirrors the teacher's `firezone-logging::setup_global_subscriber`: an
/// `EnvFilter` driven by `RUST_LOG`, defaulting to `info` when unset.
pub fn init_global_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// Test-scoped subscriber writing through the test harness's captured
/// stdout, following `RUST_LOG` if set. Not gated behind `#[cfg(test)]` so
/// integration tests under `tests/` can use it as a dev-dependency too.
pub fn test_subscriber(directives: &str) -> tracing::subscriber::DefaultGuard {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("debug")))
        .set_default()
}
