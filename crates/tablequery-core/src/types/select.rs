//! Headers describing the columns of a query result.

use serde::{Deserialize, Serialize};

use super::column::ColumnType;
use super::id::ColumnId;

/// One output column of a compiled query, in select-list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectColumn {
    /// The expression text or alias the column was selected as.
    pub name: String,
    /// The inferred type of the values.
    pub column_type: ColumnType,
    /// The source column id, when the column maps to exactly one stored column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ColumnId>,
}

impl SelectColumn {
    /// Create a select column without a source id.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            id: None,
        }
    }

    /// Set the source column id.
    #[must_use]
    pub const fn with_id(mut self, id: ColumnId) -> Self {
        self.id = Some(id);
        self
    }
}
