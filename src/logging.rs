//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr so that command output on stdout stays
//! parseable. `RUST_LOG` wins over the `-v` flag when set.

use tracing_subscriber::EnvFilter;

/// Map the CLI verbosity count to a default filter directive.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub fn init(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
