//! Diagnostic logging to stderr.
//!
//! `RUST_LOG` wins when set. Otherwise only warnings are shown, or debug
//! output from tether itself with `--verbose`.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose { "warn,tether=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
