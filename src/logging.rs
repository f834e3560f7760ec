use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays clean. `RUST_LOG` wins over the configured level.
pub fn setup_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
