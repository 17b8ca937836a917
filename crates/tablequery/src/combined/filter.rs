//! Additional query filters.
//!
//! Filters arrive from callers alongside a query and narrow it without the
//! caller editing the SQL. Values are escaped into the condition text rather
//! than bound, so the combined query is again plain query text.

use serde::{Deserialize, Serialize};

use crate::ast::{ColumnReference, Expr, Identifier};
use crate::error::{TranslateError, TranslateResult};

/// Comparison applied by a single-value filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SingleValueOperator {
    /// `col LIKE v`, once per value.
    Like,
    /// `col = v`, once per value.
    Equal,
    /// `col IN ( v1, v2 )`.
    In,
}

/// Function applied by a list-column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MultiValueFunction {
    /// Some element equals one of the values.
    Has,
    /// Some element matches one of the patterns.
    HasLike,
}

/// A filter combined into the WHERE or DEFINING_WHERE of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "concreteType")]
pub enum QueryFilter {
    /// A comparison of a scalar column against one or more values.
    #[serde(rename = "ColumnSingleValueQueryFilter", rename_all = "camelCase")]
    SingleValue {
        /// The filtered column, as named in the query.
        column_name: String,
        /// The comparison.
        operator: SingleValueOperator,
        /// The values compared against, OR-combined.
        values: Vec<String>,
        /// Whether the filter applies inside the defining SQL.
        #[serde(default)]
        is_defining_condition: bool,
    },
    /// A `HAS` or `HAS_LIKE` test of a list column.
    #[serde(rename = "ColumnMultiValueFunctionQueryFilter", rename_all = "camelCase")]
    MultiValueFunction {
        /// The filtered list column.
        column_name: String,
        /// The list function.
        function: MultiValueFunction,
        /// The values any element must match.
        values: Vec<String>,
        /// Whether the filter applies inside the defining SQL.
        #[serde(default)]
        is_defining_condition: bool,
    },
    /// A full-text search.
    #[serde(rename = "TextMatchesQueryFilter", rename_all = "camelCase")]
    TextMatches {
        /// The search text.
        search_expression: String,
        /// Whether the filter applies inside the defining SQL.
        #[serde(default)]
        is_defining_condition: bool,
    },
}

impl QueryFilter {
    /// Creates a non-defining single-value filter.
    #[must_use]
    pub fn single_value(
        column_name: impl Into<String>,
        operator: SingleValueOperator,
        values: Vec<String>,
    ) -> Self {
        Self::SingleValue {
            column_name: column_name.into(),
            operator,
            values,
            is_defining_condition: false,
        }
    }

    /// Creates a non-defining list-column filter.
    #[must_use]
    pub fn multi_value(
        column_name: impl Into<String>,
        function: MultiValueFunction,
        values: Vec<String>,
    ) -> Self {
        Self::MultiValueFunction {
            column_name: column_name.into(),
            function,
            values,
            is_defining_condition: false,
        }
    }

    /// Creates a non-defining full-text filter.
    #[must_use]
    pub fn text_matches(search_expression: impl Into<String>) -> Self {
        Self::TextMatches { search_expression: search_expression.into(), is_defining_condition: false }
    }

    /// Marks the filter as applying inside the defining SQL.
    #[must_use]
    pub fn defining(mut self) -> Self {
        match &mut self {
            Self::SingleValue { is_defining_condition, .. }
            | Self::MultiValueFunction { is_defining_condition, .. }
            | Self::TextMatches { is_defining_condition, .. } => *is_defining_condition = true,
        }
        self
    }

    /// Returns `true` if the filter applies inside the defining SQL.
    #[must_use]
    pub const fn is_defining_condition(&self) -> bool {
        match self {
            Self::SingleValue { is_defining_condition, .. }
            | Self::MultiValueFunction { is_defining_condition, .. }
            | Self::TextMatches { is_defining_condition, .. } => *is_defining_condition,
        }
    }

    /// The parenthesized condition this filter adds.
    ///
    /// # Errors
    ///
    /// Fails if the column name or the values are missing.
    pub fn to_condition(&self) -> TranslateResult<Expr> {
        let condition = match self {
            Self::SingleValue { column_name, operator, values, .. } => {
                let column = filter_column(column_name)?;
                let values = filter_values(values)?;
                match operator {
                    SingleValueOperator::In => Expr::InList {
                        expr: Box::new(column),
                        list: values.map(Expr::string).collect(),
                        negated: false,
                    },
                    SingleValueOperator::Like | SingleValueOperator::Equal => values
                        .map(|value| match operator {
                            SingleValueOperator::Like => Expr::Like {
                                expr: Box::new(column.clone()),
                                pattern: Box::new(Expr::string(value)),
                                escape: None,
                                negated: false,
                            },
                            _ => column.clone().eq(Expr::string(value)),
                        })
                        .reduce(Expr::or)
                        .ok_or(TranslateError::MissingInput("QueryFilter.values"))?,
                }
            }
            Self::MultiValueFunction { column_name, function, values, .. } => Expr::Has {
                expr: Box::new(filter_column(column_name)?),
                list: filter_values(values)?.map(Expr::string).collect(),
                like: *function == MultiValueFunction::HasLike,
                negated: false,
            },
            Self::TextMatches { search_expression, .. } => {
                if search_expression.is_empty() {
                    return Err(TranslateError::MissingInput("TextMatchesQueryFilter.searchExpression"));
                }
                Expr::TextMatches(Box::new(Expr::string(search_expression.as_str())))
            }
        };
        Ok(condition.nested())
    }
}

/// A double-quoted reference to the column named `name`.
pub(crate) fn quoted_column(name: &str) -> Expr {
    Expr::Column(ColumnReference::simple(Identifier::quoted(name, '"')))
}

fn filter_column(name: &str) -> TranslateResult<Expr> {
    if name.is_empty() {
        return Err(TranslateError::MissingInput("QueryFilter.columnName"));
    }
    Ok(quoted_column(name))
}

fn filter_values(values: &[String]) -> TranslateResult<impl Iterator<Item = &str>> {
    if values.is_empty() {
        return Err(TranslateError::MissingInput("QueryFilter.values"));
    }
    Ok(values.iter().map(String::as_str))
}

/// AND-combines the conditions of `filters`, in order.
///
/// Returns `None` when there are no filters.
pub fn combine_filters<'a>(
    filters: impl IntoIterator<Item = &'a QueryFilter>,
) -> TranslateResult<Option<Expr>> {
    let mut combined: Option<Expr> = None;
    for filter in filters {
        let condition = filter.to_condition()?;
        combined = Some(match combined {
            Some(existing) => existing.and(condition),
            None => condition,
        });
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn like_filter() {
        let filter =
            QueryFilter::single_value("myCol", SingleValueOperator::Like, values(&["foo%", "%bar", "%baz%"]));
        assert_eq!(
            filter.to_condition().unwrap().to_string(),
            "( \"myCol\" LIKE 'foo%' OR \"myCol\" LIKE '%bar' OR \"myCol\" LIKE '%baz%' )"
        );
    }

    #[test]
    fn equal_and_in_filters() {
        let equal = QueryFilter::single_value("a", SingleValueOperator::Equal, values(&["x", "it's"]));
        assert_eq!(equal.to_condition().unwrap().to_string(), "( \"a\" = 'x' OR \"a\" = 'it''s' )");
        let in_list = QueryFilter::single_value("a", SingleValueOperator::In, values(&["1", "2"]));
        assert_eq!(in_list.to_condition().unwrap().to_string(), "( \"a\" IN ( '1', '2' ) )");
    }

    #[test]
    fn list_filters() {
        let has = QueryFilter::multi_value("tags", MultiValueFunction::Has, values(&["a", "b"]));
        assert_eq!(has.to_condition().unwrap().to_string(), "( \"tags\" HAS ( 'a', 'b' ) )");
        let has_like = QueryFilter::multi_value("tags", MultiValueFunction::HasLike, values(&["a%"]));
        assert_eq!(has_like.to_condition().unwrap().to_string(), "( \"tags\" HAS_LIKE ( 'a%' ) )");
    }

    #[test]
    fn text_matches_filter() {
        let filter = QueryFilter::text_matches("some text");
        assert_eq!(filter.to_condition().unwrap().to_string(), "( TEXT_MATCHES('some text') )");
    }

    #[test]
    fn quoted_column_names() {
        let filter = QueryFilter::single_value("has\"quote", SingleValueOperator::Equal, values(&["x"]));
        assert_eq!(filter.to_condition().unwrap().to_string(), "( \"has\"\"quote\" = 'x' )");
    }

    #[test]
    fn missing_inputs() {
        let filter = QueryFilter::single_value("", SingleValueOperator::Like, values(&["x"]));
        assert_eq!(filter.to_condition().unwrap_err(), TranslateError::MissingInput("QueryFilter.columnName"));
        let filter = QueryFilter::single_value("a", SingleValueOperator::Like, vec![]);
        assert_eq!(filter.to_condition().unwrap_err(), TranslateError::MissingInput("QueryFilter.values"));
    }

    #[test]
    fn combined_in_order() {
        let filters = [
            QueryFilter::single_value("myCol", SingleValueOperator::Like, values(&["foo%"])),
            QueryFilter::single_value("otherCol", SingleValueOperator::Like, values(&["%asdf"])),
        ];
        assert_eq!(
            combine_filters(&filters).unwrap().unwrap().to_string(),
            "( \"myCol\" LIKE 'foo%' ) AND ( \"otherCol\" LIKE '%asdf' )"
        );
        assert_eq!(combine_filters(&[]).unwrap(), None);
    }

    #[test]
    fn serde_wire_format() {
        let json = r#"{"concreteType":"ColumnSingleValueQueryFilter","columnName":"a","operator":"LIKE","values":["x%"],"isDefiningCondition":true}"#;
        let filter: QueryFilter = serde_json::from_str(json).unwrap();
        assert!(filter.is_defining_condition());
        assert_eq!(
            filter,
            QueryFilter::single_value("a", SingleValueOperator::Like, values(&["x%"])).defining()
        );

        let json = r#"{"concreteType":"ColumnMultiValueFunctionQueryFilter","columnName":"t","function":"HAS_LIKE","values":["a"]}"#;
        let filter: QueryFilter = serde_json::from_str(json).unwrap();
        assert!(!filter.is_defining_condition());
    }
}
