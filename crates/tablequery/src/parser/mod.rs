//! Parser for the table query dialect.
//!
//! This module turns query text into the AST defined in [`crate::ast`].
//!
//! # Overview
//!
//! Tokenization is delegated to [`sqlparser-rs`](https://crates.io/crates/sqlparser)
//! with its generic dialect. On top of the tokens sits a small recursive-descent
//! grammar for the dialect, which extends plain SQL with:
//!
//! - **Table ids**: `syn123` and versioned `syn123.4` in `FROM`
//! - **`DEFINING_WHERE`**: a filter pushed into a virtual table's defining query
//! - **List predicates**: `col HAS ( ... )` and `col HAS_LIKE ( ... )`
//! - **Double predicates**: `isNaN(col)` and `isInfinity(col)`
//! - **Search**: `TEXT_MATCHES('text')`
//!
//! # Usage
//!
//! ```ignore
//! use tablequery::parser::parse_query;
//!
//! let query = parse_query("select foo from syn123 where bar > 1")?;
//! assert_eq!(query.to_string(), "SELECT foo FROM syn123 WHERE bar > 1");
//! ```
//!
//! Standalone search conditions, as used by filters and facets, go through
//! [`parse_expression`].

mod sql;
mod tokens;

pub use sql::{parse_expression, parse_query};
