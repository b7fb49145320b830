//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber writing to stderr, so replies on stdout stay clean.
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `info` with node logging when `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,manual_agent=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
