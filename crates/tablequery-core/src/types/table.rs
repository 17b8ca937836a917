//! Kinds of tables a query can target.

use serde::{Deserialize, Serialize};

/// The kind of object backing a table identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    /// A plain table with user-managed rows.
    Table,
    /// A view over entities, carrying per-row authorization.
    EntityView,
    /// A view over submissions, carrying per-row authorization.
    SubmissionView,
    /// A curated dataset view.
    Dataset,
    /// A table materialized from a defining query.
    MaterializedView,
    /// A named query evaluated on read.
    VirtualTable,
}

impl TableType {
    /// Returns `true` for views whose rows carry an entity etag and a
    /// benefactor column.
    #[must_use]
    pub const fn is_view_entity_type(self) -> bool {
        matches!(self, Self::EntityView | Self::SubmissionView | Self::Dataset)
    }
}
