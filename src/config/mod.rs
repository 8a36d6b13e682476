//! Recipe file parsing and validation
//!
//! This module handles discovery and parsing of justfiles and validation
//! of the parsed recipe graph.

pub mod dotenv;
pub mod expression;
pub mod lexer;
pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use dotenv::*;
pub use expression::parse_expression;
pub use parse::*;
pub use schema::*;
pub use types::*;
