use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

/// Logs go to stderr so they never interleave with the progress line.
/// `RUST_LOG` wins over the verbosity flag.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
}
