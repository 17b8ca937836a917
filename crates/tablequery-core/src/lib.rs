//! Table Query Core
//!
//! This crate provides the types shared by every layer of the table query
//! compiler: table identifiers, column descriptors, select-column headers and
//! bound parameter values.
//!
//! # Example
//!
//! ```
//! use tablequery_core::{ColumnId, ColumnModel, ColumnType, IdAndVersion};
//!
//! let table: IdAndVersion = "syn123.4".parse().unwrap();
//! assert_eq!(table.id(), 123);
//! assert_eq!(table.version(), Some(4));
//!
//! let column = ColumnModel::new(ColumnId::new(111), "foo", ColumnType::String).with_max_size(50);
//! assert_eq!(column.max_size(), Some(50));
//! ```
//!
//! # Modules
//!
//! - [`types`] - Identifiers, column descriptors, select columns and values
//! - [`size`] - Worst-case row size computation
//! - [`error`] - Error types ([`CoreError`])

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod size;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, CoreResult};
pub use types::{
    ColumnId, ColumnModel, ColumnType, FacetType, IdAndVersion, JsonSubColumnModel, ParameterValue,
    SelectColumn, TableType,
};
