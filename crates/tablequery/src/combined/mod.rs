//! Combined queries.
//!
//! A [`CombinedQuery`] merges a user's query text with the overrides a
//! caller sends beside it: facet selections, additional filters, sort items
//! and a page window. The result is again query text over logical names,
//! ready for the [`QueryTranslator`](crate::QueryTranslator).
//!
//! Clauses are assembled in query order: WITH, SELECT ... FROM,
//! DEFINING_WHERE, WHERE, GROUP BY, ORDER BY, LIMIT and OFFSET. With no
//! overrides the combined text is the canonical rendering of the base query.

pub mod facet;
pub mod filter;
pub mod sort;

use tablequery_core::ColumnModel;
use tracing::debug;

use crate::ast::{
    ColumnReference, Expr, FunctionCall, Pagination, QueryExpression, QuerySpecification, SelectItem,
    SelectList,
};
use crate::error::{TranslateError, TranslateResult};
use crate::naming;
use crate::parser::parse_query;
use crate::translate::pagination::{self, UNBOUNDED_LIMIT};

pub use facet::{FacetColumnRequest, FacetRequestColumnModel, NULL_VALUE_KEYWORD};
pub use filter::{MultiValueFunction, QueryFilter, SingleValueOperator};
pub use sort::{SortDirection, SortItem};

/// Overrides applied to a base query.
#[derive(Debug, Clone, Default)]
pub struct CombinedQueryBuilder {
    sql: String,
    schema: Vec<ColumnModel>,
    selected_facets: Vec<FacetColumnRequest>,
    additional_filters: Vec<QueryFilter>,
    sort: Vec<SortItem>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl CombinedQueryBuilder {
    /// Sets the schema facet selections are resolved against.
    #[must_use]
    pub fn with_schema(mut self, schema: Vec<ColumnModel>) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the facet selections.
    #[must_use]
    pub fn with_selected_facets(mut self, facets: Vec<FacetColumnRequest>) -> Self {
        self.selected_facets = facets;
        self
    }

    /// Sets the additional filters.
    #[must_use]
    pub fn with_additional_filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.additional_filters = filters;
        self
    }

    /// Sets the sort items placed ahead of the query's own ORDER BY.
    #[must_use]
    pub fn with_sort(mut self, sort: Vec<SortItem>) -> Self {
        self.sort = sort;
        self
    }

    /// Replaces the query's OFFSET.
    #[must_use]
    pub const fn with_offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    /// Replaces the query's LIMIT.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Parses the base query and applies the overrides.
    ///
    /// # Errors
    ///
    /// Fails if the base query does not parse, a facet does not resolve, or
    /// a filter is incomplete.
    pub fn build(self) -> TranslateResult<CombinedQuery> {
        let mut query = parse_query(&self.sql)?;

        let facets = self
            .selected_facets
            .into_iter()
            .map(|request| FacetRequestColumnModel::resolve(&self.schema, request))
            .collect::<TranslateResult<Vec<_>>>()?;

        let (defining, filters): (Vec<&QueryFilter>, Vec<&QueryFilter>) =
            self.additional_filters.iter().partition(|f| f.is_defining_condition());
        let defining_condition = filter::combine_filters(defining)?;
        let search_condition = match (facet::combine_facets(&facets), filter::combine_filters(filters)?) {
            (Some(facets), Some(filters)) => Some(facets.and(filters)),
            (facets, filters) => facets.or(filters),
        };

        for spec in query.specifications_mut() {
            if let Some(condition) = &defining_condition {
                spec.defining_where = Some(combine_condition(spec.defining_where.take(), condition.clone()));
            }
            if let Some(condition) = &search_condition {
                spec.where_clause = Some(combine_condition(spec.where_clause.take(), condition.clone()));
            }
        }

        if let Some(last) = query.specifications_mut().last() {
            if !self.sort.is_empty() {
                let mut order_by: Vec<_> = self.sort.iter().map(SortItem::to_order_by).collect();
                order_by.append(&mut last.order_by);
                last.order_by = order_by;
            }
            last.pagination = replace_pagination(last.pagination.take(), self.offset, self.limit)?;
        }

        debug!(
            facets = facets.len(),
            filters = self.additional_filters.len(),
            sort = self.sort.len(),
            offset = ?self.offset,
            limit = ?self.limit,
            "combined query overrides"
        );
        Ok(CombinedQuery { query })
    }
}

/// `( existing ) AND ( added )`, or `added` alone.
fn combine_condition(existing: Option<Expr>, added: Expr) -> Expr {
    match existing {
        Some(existing) => existing.parenthesized().and(added.parenthesized()),
        None => added,
    }
}

/// The query window with the given offset and limit replacing its own.
fn replace_pagination(
    current: Option<Pagination>,
    offset: Option<u64>,
    limit: Option<u64>,
) -> TranslateResult<Option<Pagination>> {
    if offset.is_none() && limit.is_none() {
        return Ok(current);
    }
    let (current_limit, current_offset) = pagination::window(current.as_ref())?;
    let limit = limit.or(current_limit).unwrap_or(UNBOUNDED_LIMIT);
    let offset = offset.or(current_offset);
    Ok(Some(Pagination::new(limit, offset)))
}

/// A base query with overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedQuery {
    query: QueryExpression,
}

impl CombinedQuery {
    /// Starts combining overrides into `sql`.
    #[must_use]
    pub fn builder(sql: impl Into<String>) -> CombinedQueryBuilder {
        CombinedQueryBuilder { sql: sql.into(), ..CombinedQueryBuilder::default() }
    }

    /// The combined query.
    #[must_use]
    pub const fn query(&self) -> &QueryExpression {
        &self.query
    }

    /// Consumes the combined query, returning the parsed statement.
    #[must_use]
    pub fn into_query(self) -> QueryExpression {
        self.query
    }

    /// The combined query text.
    #[must_use]
    pub fn combined_sql(&self) -> String {
        self.query.to_string()
    }

    /// A query counting the rows of this one.
    ///
    /// Grouped queries count their distinct groups and DISTINCT queries their
    /// distinct rows. Returns `None` for a query that aggregates to a single
    /// row, and for a UNION.
    #[must_use]
    pub fn count_query(&self) -> Option<String> {
        if self.query.is_union() {
            return None;
        }
        let mut count = self.query.clone();
        let spec = &mut count.body;
        let select = count_select(spec)?;
        spec.select_list = SelectList::Items(vec![SelectItem::expr(select)]);
        spec.distinct = false;
        spec.group_by.clear();
        spec.order_by.clear();
        spec.pagination = None;
        Some(count.to_string())
    }

    /// A query selecting `ROW_ID` and `ROW_VERSION` of the rows of this one,
    /// at most `max_limit` of them.
    ///
    /// Returns `None` for aggregated queries and for a UNION.
    #[must_use]
    pub fn row_id_and_version_query(&self, max_limit: u64) -> Option<String> {
        if self.query.is_union() || self.query.body.is_aggregate() {
            return None;
        }
        let mut rows = self.query.clone();
        let spec = &mut rows.body;
        spec.select_list = SelectList::Items(vec![
            SelectItem::expr(Expr::Column(ColumnReference::simple(naming::ROW_ID))),
            SelectItem::expr(Expr::Column(ColumnReference::simple(naming::ROW_VERSION))),
        ]);
        spec.order_by.clear();
        spec.pagination = Some(Pagination::new(max_limit, None));
        Some(rows.to_string())
    }
}

/// The select item of the count query, or `None` if the query already
/// aggregates to one row.
fn count_select(spec: &QuerySpecification) -> Option<Expr> {
    if !spec.is_aggregate() {
        return Some(Expr::function("COUNT", vec![Expr::Wildcard]));
    }
    let items = match &spec.select_list {
        SelectList::Items(items) => items.as_slice(),
        SelectList::Star => &[],
    };
    let args: Vec<Expr> = if !spec.group_by.is_empty() {
        spec.group_by
            .iter()
            .map(|key| group_key_expr(key, items))
            .collect()
    } else if spec.distinct && !items.is_empty() {
        items.iter().map(|item| item.expr.clone()).collect()
    } else {
        return None;
    };
    let mut call = FunctionCall::new("COUNT", args);
    call.distinct = true;
    Some(Expr::Function(call))
}

/// A GROUP BY key naming a select alias stands for the aliased expression.
fn group_key_expr(key: &Expr, items: &[SelectItem]) -> Expr {
    if let Expr::Column(column) = key {
        let name = column.unquoted_text();
        if let Some(item) = items.iter().find(|i| i.alias.as_ref().is_some_and(|a| a.name == name)) {
            return item.expr.clone();
        }
    }
    key.clone()
}

impl std::fmt::Display for CombinedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.query)
    }
}

impl From<CombinedQuery> for QueryExpression {
    fn from(combined: CombinedQuery) -> Self {
        combined.query
    }
}

impl TryFrom<&str> for CombinedQuery {
    type Error = TranslateError;

    fn try_from(sql: &str) -> TranslateResult<Self> {
        Self::builder(sql).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablequery_core::{ColumnId, ColumnType, FacetType};

    fn schema() -> Vec<ColumnModel> {
        vec![
            ColumnModel::new(ColumnId::new(1), "foo", ColumnType::String).with_facet_type(FacetType::Enumeration),
            ColumnModel::new(ColumnId::new(2), "bar", ColumnType::Integer).with_facet_type(FacetType::Range),
        ]
    }

    fn combined(builder: CombinedQueryBuilder) -> String {
        builder.with_schema(schema()).build().unwrap().combined_sql()
    }

    #[test]
    fn no_overrides_is_canonical() {
        let sql = "select foo, bar from syn123 where bar > 1 order by foo limit 10";
        let query = CombinedQuery::builder(sql).build().unwrap();
        assert_eq!(query.combined_sql(), parse_query(sql).unwrap().to_string());
    }

    #[test]
    fn facets_and_filters_and_existing_where() {
        let sql = combined(
            CombinedQuery::builder("select * from syn123 where bar > 1")
                .with_selected_facets(vec![FacetColumnRequest::values("foo", vec!["a".to_string()])])
                .with_additional_filters(vec![QueryFilter::single_value(
                    "foo",
                    SingleValueOperator::Like,
                    vec!["x%".to_string()],
                )]),
        );
        assert_eq!(
            sql,
            "SELECT * FROM syn123 WHERE ( bar > 1 ) AND ( ( \"foo\" = 'a' ) AND ( \"foo\" LIKE 'x%' ) )"
        );
    }

    #[test]
    fn defining_filters_go_to_defining_where() {
        let sql = combined(
            CombinedQuery::builder("select * from syn123").with_additional_filters(vec![
                QueryFilter::single_value("foo", SingleValueOperator::Equal, vec!["5".to_string()]).defining(),
                QueryFilter::single_value("bar", SingleValueOperator::Equal, vec!["6".to_string()]),
            ]),
        );
        assert_eq!(sql, "SELECT * FROM syn123 DEFINING_WHERE ( \"foo\" = '5' ) WHERE ( \"bar\" = '6' )");
    }

    #[test]
    fn sort_is_prepended() {
        let sql = combined(
            CombinedQuery::builder("select * from syn123 order by bar desc")
                .with_sort(vec![SortItem::new("foo"), SortItem::with_direction("bar", SortDirection::Asc)]),
        );
        assert_eq!(sql, "SELECT * FROM syn123 ORDER BY \"foo\" ASC, \"bar\" ASC, bar DESC");
    }

    #[test]
    fn pagination_is_replaced() {
        let sql = combined(CombinedQuery::builder("select * from syn123 limit 10 offset 5").with_limit(Some(3)));
        assert_eq!(sql, "SELECT * FROM syn123 LIMIT 3 OFFSET 5");
        let sql = combined(CombinedQuery::builder("select * from syn123").with_offset(Some(7)).with_limit(Some(2)));
        assert_eq!(sql, "SELECT * FROM syn123 LIMIT 2 OFFSET 7");
    }

    #[test]
    fn count_queries() {
        let count = |sql: &str| CombinedQuery::try_from(sql).unwrap().count_query();
        assert_eq!(
            count("select foo from syn123 where bar > 1 order by foo limit 3").unwrap(),
            "SELECT COUNT(*) FROM syn123 WHERE bar > 1"
        );
        assert_eq!(
            count("select foo as f, count(*) from syn123 group by f, bar").unwrap(),
            "SELECT COUNT(DISTINCT foo, bar) FROM syn123"
        );
        assert_eq!(count("select distinct foo, bar as b from syn123").unwrap(), "SELECT COUNT(DISTINCT foo, bar) FROM syn123");
        assert_eq!(count("select count(*) from syn123"), None);
    }

    #[test]
    fn row_id_and_version_queries() {
        let query = CombinedQuery::try_from("select foo from syn123 where bar > 1 order by foo limit 3").unwrap();
        assert_eq!(
            query.row_id_and_version_query(1000).unwrap(),
            "SELECT ROW_ID, ROW_VERSION FROM syn123 WHERE bar > 1 LIMIT 1000"
        );
        let query = CombinedQuery::try_from("select count(*) from syn123").unwrap();
        assert_eq!(query.row_id_and_version_query(1000), None);
    }

    #[test]
    fn unresolved_facet() {
        let err = CombinedQuery::builder("select * from syn123")
            .with_selected_facets(vec![FacetColumnRequest::values("nope", vec![])])
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Facet column 'nope' does not exist in the schema");
    }
}
