//! Facet selections.
//!
//! A facet is a column, or a path inside a JSON column, that the schema
//! offers as a filter. A selection picks values of an enumeration facet or
//! bounds of a range facet and narrows the query to matching rows.

use serde::{Deserialize, Serialize};
use tablequery_core::{ColumnModel, ColumnType, FacetType};
use tracing::trace;

use crate::ast::{BinaryOp, CastTarget, Expr};
use crate::error::{TranslateError, TranslateResult};

use super::filter::quoted_column;

/// Stands for NULL in facet values and range bounds.
pub const NULL_VALUE_KEYWORD: &str = "org.sagebionetworks.UNDEFINED_NULL_NOTSET";

/// A selection on one facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "concreteType")]
pub enum FacetColumnRequest {
    /// Selected values of an enumeration facet.
    #[serde(rename = "FacetColumnValuesRequest", rename_all = "camelCase")]
    Values {
        /// The faceted column.
        column_name: String,
        /// Path inside a JSON column.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        json_path: Option<String>,
        /// The selected values, OR-combined.
        #[serde(default)]
        facet_values: Vec<String>,
    },
    /// Bounds on a range facet.
    #[serde(rename = "FacetColumnRangeRequest", rename_all = "camelCase")]
    Range {
        /// The faceted column.
        column_name: String,
        /// Path inside a JSON column.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        json_path: Option<String>,
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<String>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<String>,
    },
}

impl FacetColumnRequest {
    /// Creates a value selection.
    #[must_use]
    pub fn values(column_name: impl Into<String>, facet_values: Vec<String>) -> Self {
        Self::Values { column_name: column_name.into(), json_path: None, facet_values }
    }

    /// Creates a range selection.
    #[must_use]
    pub fn range(column_name: impl Into<String>, min: Option<String>, max: Option<String>) -> Self {
        Self::Range { column_name: column_name.into(), json_path: None, min, max }
    }

    /// Selects a path inside a JSON column.
    #[must_use]
    pub fn with_json_path(mut self, path: impl Into<String>) -> Self {
        match &mut self {
            Self::Values { json_path, .. } | Self::Range { json_path, .. } => *json_path = Some(path.into()),
        }
        self
    }

    /// The faceted column.
    #[must_use]
    pub fn column_name(&self) -> &str {
        match self {
            Self::Values { column_name, .. } | Self::Range { column_name, .. } => column_name,
        }
    }

    /// The selected JSON path, if any.
    #[must_use]
    pub fn json_path(&self) -> Option<&str> {
        match self {
            Self::Values { json_path, .. } | Self::Range { json_path, .. } => json_path.as_deref(),
        }
    }

    const fn facet_type(&self) -> FacetType {
        match self {
            Self::Values { .. } => FacetType::Enumeration,
            Self::Range { .. } => FacetType::Range,
        }
    }
}

/// A facet selection resolved against the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetRequestColumnModel {
    column_name: String,
    json_path: Option<String>,
    facet_type: FacetType,
    column_type: ColumnType,
    request: FacetColumnRequest,
}

impl FacetRequestColumnModel {
    /// Resolves `request` against `schema`.
    ///
    /// # Errors
    ///
    /// Fails if the column is not in the schema or not faceted, if the JSON
    /// path matches no sub-column, or if the request kind does not match the
    /// facet type.
    pub fn resolve(schema: &[ColumnModel], request: FacetColumnRequest) -> TranslateResult<Self> {
        let name = request.column_name().to_string();
        let column = schema.iter().find(|c| c.name() == name).ok_or_else(|| {
            TranslateError::UnresolvedFacet(format!("Facet column '{name}' does not exist in the schema"))
        })?;

        let sub_columns = column.json_sub_columns();
        let (json_path, facet_type, column_type) = if sub_columns.is_empty() {
            let facet_type = column.facet_type().ok_or_else(|| {
                TranslateError::UnresolvedFacet(format!("Column '{name}' is not faceted"))
            })?;
            if let Some(path) = request.json_path() {
                return Err(TranslateError::UnresolvedFacet(format!(
                    "Column '{name}' has no JSON sub-column at '{path}'"
                )));
            }
            (None, facet_type, column.column_type())
        } else {
            let requested = request.json_path();
            let sub_column =
                sub_columns.iter().find(|s| Some(s.json_path.as_str()) == requested).ok_or_else(|| {
                    let expected: Vec<&str> = sub_columns.iter().map(|s| s.json_path.as_str()).collect();
                    TranslateError::UnresolvedFacet(format!(
                        "Unexpected facet request jsonPath (Was '{}', Expected '{}')",
                        requested.unwrap_or("null"),
                        expected.join("', '")
                    ))
                })?;
            (Some(sub_column.json_path.clone()), sub_column.facet_type, sub_column.column_type)
        };

        if request.facet_type() != facet_type {
            return Err(TranslateError::InvalidOperand(format!(
                "Facet '{name}' is of type {} and does not accept this request",
                facet_type_name(facet_type)
            )));
        }
        trace!(column = %name, json_path = ?json_path, "resolved facet");
        Ok(Self { column_name: name, json_path, facet_type, column_type, request })
    }

    /// The faceted column.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// The JSON path of the facet, if it is a sub-column.
    #[must_use]
    pub fn json_path(&self) -> Option<&str> {
        self.json_path.as_deref()
    }

    /// The type of the facet.
    #[must_use]
    pub const fn facet_type(&self) -> FacetType {
        self.facet_type
    }

    /// The request this facet was resolved from.
    #[must_use]
    pub const fn request(&self) -> &FacetColumnRequest {
        &self.request
    }

    /// The condition selecting the requested rows, or `None` if the request
    /// selects nothing.
    #[must_use]
    pub fn search_condition(&self) -> Option<Expr> {
        let subject = match &self.json_path {
            Some(path) => Expr::function(
                "JSON_EXTRACT",
                vec![quoted_column(&self.column_name), Expr::string(path.as_str())],
            ),
            None => quoted_column(&self.column_name),
        };
        let cast = self.json_path.as_ref().map(|_| self.column_type);
        match &self.request {
            FacetColumnRequest::Values { facet_values, .. } if self.column_type.is_list() => {
                list_enumeration_condition(subject, facet_values)
            }
            FacetColumnRequest::Values { facet_values, .. } => {
                enumeration_condition(subject, facet_values, cast)
            }
            FacetColumnRequest::Range { min, max, .. } => {
                range_condition(subject, min.as_deref(), max.as_deref(), cast)
            }
        }
    }
}

const fn facet_type_name(facet_type: FacetType) -> &'static str {
    match facet_type {
        FacetType::Enumeration => "enumeration",
        FacetType::Range => "range",
    }
}

/// A facet value, cast to the sub-column type when one is declared.
fn facet_value(value: &str, cast: Option<ColumnType>) -> Expr {
    match cast {
        Some(column_type) => {
            Expr::Cast { expr: Box::new(Expr::string(value)), target: CastTarget::Type(column_type) }
        }
        None => Expr::string(value),
    }
}

/// `( col IS NULL OR col = 'a' OR ... )`, in value order.
pub fn enumeration_condition(subject: Expr, values: &[String], cast: Option<ColumnType>) -> Option<Expr> {
    values
        .iter()
        .map(|value| {
            if value == NULL_VALUE_KEYWORD {
                subject.clone().is_null(false)
            } else {
                subject.clone().eq(facet_value(value, cast))
            }
        })
        .reduce(Expr::or)
        .map(Expr::nested)
}

/// `( col HAS ( 'a', 'b' ) OR col IS NULL )`.
pub fn list_enumeration_condition(subject: Expr, values: &[String]) -> Option<Expr> {
    let includes_null = values.iter().any(|v| v == NULL_VALUE_KEYWORD);
    let list: Vec<Expr> =
        values.iter().filter(|v| *v != NULL_VALUE_KEYWORD).map(|v| Expr::string(v.as_str())).collect();
    let has = (!list.is_empty()).then(|| Expr::Has {
        expr: Box::new(subject.clone()),
        list,
        like: false,
        negated: false,
    });
    let is_null = includes_null.then(|| subject.is_null(false));
    let condition = match (has, is_null) {
        (Some(has), Some(is_null)) => has.or(is_null),
        (Some(condition), None) | (None, Some(condition)) => condition,
        (None, None) => return None,
    };
    Some(condition.nested())
}

/// `( col BETWEEN min AND max )`, `( col >= min )` or `( col <= max )`.
///
/// An empty bound is absent; the null keyword in either bound selects
/// `( col IS NULL )`.
pub fn range_condition(
    subject: Expr,
    min: Option<&str>,
    max: Option<&str>,
    cast: Option<ColumnType>,
) -> Option<Expr> {
    let min = min.filter(|m| !m.is_empty());
    let max = max.filter(|m| !m.is_empty());
    if min == Some(NULL_VALUE_KEYWORD) || max == Some(NULL_VALUE_KEYWORD) {
        return Some(subject.is_null(false).nested());
    }
    let condition = match (min, max) {
        (Some(min), Some(max)) => Expr::Between {
            expr: Box::new(subject),
            low: Box::new(facet_value(min, cast)),
            high: Box::new(facet_value(max, cast)),
            negated: false,
        },
        (Some(min), None) => Expr::binary(subject, BinaryOp::GtEq, facet_value(min, cast)),
        (None, Some(max)) => Expr::binary(subject, BinaryOp::LtEq, facet_value(max, cast)),
        (None, None) => return None,
    };
    Some(condition.nested())
}

/// AND-combines the conditions of `facets`, skipping empty selections.
pub fn combine_facets<'a>(facets: impl IntoIterator<Item = &'a FacetRequestColumnModel>) -> Option<Expr> {
    facets.into_iter().filter_map(FacetRequestColumnModel::search_condition).reduce(Expr::and)
}
