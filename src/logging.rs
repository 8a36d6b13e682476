//! Diagnostic logging setup
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` takes precedence;
//! otherwise only warnings are shown, or everything down to `debug` with
//! `--verbose`.

use crate::runner::Verbosity;
use std::io;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbosity: Verbosity) {
    let default_level = match verbosity {
        Verbosity::Verbose => "debug",
        Verbosity::Silent => "error",
        _ => "warn",
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
