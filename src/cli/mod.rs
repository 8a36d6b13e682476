//! CLI interface and argument parsing
//!
//! This module handles command-line interface parsing, recipe listing
//! and shell completion.

pub mod app;

// Re-export main types
pub use app::*;
