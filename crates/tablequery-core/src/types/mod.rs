//! Core data types for the table query compiler.
//!
//! This module defines table identifiers, column descriptors and the values
//! a compiled statement exposes to its caller.

mod column;
mod id;
mod select;
mod table;
mod value;

pub use column::{ColumnModel, ColumnType, FacetType, JsonSubColumnModel};
pub use id::{ColumnId, IdAndVersion};
pub use select::SelectColumn;
pub use table::TableType;
pub use value::ParameterValue;
