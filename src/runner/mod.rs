//! Recipe execution engine
//!
//! This module handles variable resolution, rendering of recipe bodies,
//! dependency ordering and running command lines.

pub mod command;
pub mod context;
pub mod evaluate;
pub mod executor;
pub mod function;
pub mod interpolate;
pub mod signals;

// Re-export main types
pub use command::*;
pub use context::*;
pub use evaluate::*;
pub use executor::*;
pub use interpolate::*;
