//! Schema lookups consumed by the translator.
//!
//! The translator never stores schemas itself. Every table reference and every
//! `CAST(x AS <column id>)` is resolved through a [`SchemaProvider`] supplied
//! by the caller.

use std::collections::HashMap;

use tablequery_core::{ColumnId, ColumnModel, IdAndVersion};

/// Catalog interface for table schemas and column descriptors.
///
/// Implementations may block on an external store. The translator issues one
/// `get_table_schema` call per table reference and one `get_column_model` call
/// per column-id cast, with no caching of its own.
pub trait SchemaProvider: Send + Sync {
    /// Returns the ordered columns of a table.
    ///
    /// An unknown table yields an empty schema.
    fn get_table_schema(&self, table: &IdAndVersion) -> Vec<ColumnModel>;

    /// Looks up a single column descriptor by id.
    fn get_column_model(&self, id: ColumnId) -> Option<ColumnModel>;
}

/// A provider that knows no tables.
///
/// Useful for testing or for queries that only reference metadata columns.
pub struct EmptySchemaProvider;

impl SchemaProvider for EmptySchemaProvider {
    fn get_table_schema(&self, _table: &IdAndVersion) -> Vec<ColumnModel> {
        Vec::new()
    }

    fn get_column_model(&self, _id: ColumnId) -> Option<ColumnModel> {
        None
    }
}

/// A provider backed by in-memory maps.
///
/// Columns registered through [`with_table`](Self::with_table) are also
/// available by id.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaProvider {
    tables: HashMap<IdAndVersion, Vec<ColumnModel>>,
    columns: HashMap<ColumnId, ColumnModel>,
}

impl InMemorySchemaProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the schema of a table.
    #[must_use]
    pub fn with_table(mut self, table: IdAndVersion, schema: Vec<ColumnModel>) -> Self {
        for column in &schema {
            if let Some(id) = column.id() {
                self.columns.insert(id, column.clone());
            }
        }
        self.tables.insert(table, schema);
        self
    }

    /// Registers a column that belongs to no table.
    #[must_use]
    pub fn with_column(mut self, column: ColumnModel) -> Self {
        if let Some(id) = column.id() {
            self.columns.insert(id, column);
        }
        self
    }
}

impl SchemaProvider for InMemorySchemaProvider {
    fn get_table_schema(&self, table: &IdAndVersion) -> Vec<ColumnModel> {
        self.tables.get(table).cloned().unwrap_or_default()
    }

    fn get_column_model(&self, id: ColumnId) -> Option<ColumnModel> {
        self.columns.get(&id).cloned()
    }
}
