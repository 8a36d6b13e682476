//! rjust - a small make-like recipe runner
//!
//! rjust reads justfile-style recipe files (settings, variables and named
//! recipes of shell command lines) and runs the requested recipe after its
//! dependencies, one command line at a time.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod runner;

// Re-export commonly used types
pub use error::{Result, RjustError};

/// Current version of rjust
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
