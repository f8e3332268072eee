//! MiniSQL - A minimal SQL front-end and in-memory executor
//!
//! This crate provides:
//! - SQL lexing and backtracking recursive-descent parsing into an AST
//! - An in-memory backend executing CREATE TABLE, INSERT and SELECT
//! - A session type running whole scripts against any backend

pub mod error;
pub mod sql;
