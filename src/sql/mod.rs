//! SQL processing module
//!
//! This module provides:
//! - `parser`: SQL lexer, parser and AST
//! - `types`: column types, cells and select results
//! - `schema`: table and column definitions
//! - `engine`: backend abstraction, in-memory backend and sessions

pub mod engine;
pub mod parser;
pub mod schema;
pub mod types;

pub use parser::parse;
