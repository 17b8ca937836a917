//! Sort overrides.

use serde::{Deserialize, Serialize};

use crate::ast::{Expr, OrderByExpr, Ordering};
use crate::naming;
use crate::parser::parse_expression;

use super::filter::quoted_column;

/// Direction of a sort override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// A column to sort by, ahead of the query's own ORDER BY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortItem {
    /// A column name, or an aggregate such as `MAX(foo)`.
    pub column: String,
    /// Defaults to ascending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
}

impl SortItem {
    /// Sorts by `column` ascending.
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: None }
    }

    /// Sorts by `column` in `direction`.
    #[must_use]
    pub fn with_direction(column: impl Into<String>, direction: SortDirection) -> Self {
        Self { column: column.into(), direction: Some(direction) }
    }

    /// The ORDER BY key, with its direction always written.
    #[must_use]
    pub fn to_order_by(&self) -> OrderByExpr {
        let ordering = match self.direction.unwrap_or_default() {
            SortDirection::Asc => Ordering::Asc,
            SortDirection::Desc => Ordering::Desc,
        };
        OrderByExpr::with_ordering(sort_key(&self.column), ordering)
    }
}

/// Aggregates and the row metadata columns are kept as written; any other
/// name is double-quoted.
fn sort_key(column: &str) -> Expr {
    match parse_expression(column) {
        Ok(expr) if expr.contains_set_function() => expr,
        Ok(Expr::Column(reference))
            if reference.qualifier.is_none()
                && !reference.name.is_delimited()
                && naming::is_metadata_column(&reference.name.name) =>
        {
            Expr::Column(reference)
        }
        _ => quoted_column(column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_quoted() {
        assert_eq!(SortItem::new("foo").to_order_by().to_string(), "\"foo\" ASC");
        assert_eq!(
            SortItem::with_direction("has space", SortDirection::Desc).to_order_by().to_string(),
            "\"has space\" DESC"
        );
        assert_eq!(SortItem::new("a\"b").to_order_by().to_string(), "\"a\"\"b\" ASC");
        assert_eq!(SortItem::new("foo + 1").to_order_by().to_string(), "\"foo + 1\" ASC");
    }

    #[test]
    fn aggregates_and_metadata_kept() {
        assert_eq!(SortItem::new("max(foo)").to_order_by().to_string(), "MAX(foo) ASC");
        assert_eq!(
            SortItem::with_direction("ROW_ID", SortDirection::Desc).to_order_by().to_string(),
            "ROW_ID DESC"
        );
        assert_eq!(SortItem::new("ROW_VERSION").to_order_by().to_string(), "ROW_VERSION ASC");
    }

    #[test]
    fn serde_wire_format() {
        let item: SortItem = serde_json::from_str(r#"{"column":"foo","direction":"DESC"}"#).unwrap();
        assert_eq!(item, SortItem::with_direction("foo", SortDirection::Desc));
        let item: SortItem = serde_json::from_str(r#"{"column":"foo"}"#).unwrap();
        assert_eq!(item.direction, None);
    }
}
