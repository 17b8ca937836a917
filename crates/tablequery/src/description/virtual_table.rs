//! Virtual tables: named queries evaluated on read.

use std::fmt;
use std::sync::Arc;

use tablequery_core::IdAndVersion;
use tracing::debug;

use super::{missing_description, IndexDescription, IndexDescriptionLookup};
use crate::ast::{QueryExpression, WithClause, WithElement};
use crate::error::{TranslateResult, UnsupportedConstruct};
use crate::naming;
use crate::parser::parse_query;

/// A virtual table defined by a query over another table.
#[derive(Clone)]
pub struct VirtualTableIndexDescription {
    id: IdAndVersion,
    defining_sql: String,
    lookup: Arc<dyn IndexDescriptionLookup>,
}

impl VirtualTableIndexDescription {
    /// Creates the description of a virtual table.
    #[must_use]
    pub fn new(
        id: IdAndVersion,
        defining_sql: impl Into<String>,
        lookup: Arc<dyn IndexDescriptionLookup>,
    ) -> Self {
        Self { id, defining_sql: defining_sql.into(), lookup }
    }

    /// The identifier of the virtual table.
    #[must_use]
    pub const fn id(&self) -> IdAndVersion {
        self.id
    }

    /// The defining query text.
    #[must_use]
    pub fn defining_sql(&self) -> &str {
        &self.defining_sql
    }

    pub(super) fn lookup(&self, table: &IdAndVersion) -> TranslateResult<IndexDescription> {
        self.lookup.get_index_description(table).ok_or_else(|| missing_description(table))
    }

    /// Wraps the defining SQL around `query` as `WITH T{id} AS (...)`.
    ///
    /// An outer `DEFINING_WHERE` is moved into the defining query, ANDed after
    /// its own WHERE so its parameters follow the defining query's.
    pub(super) fn preprocess(&self, mut query: QueryExpression) -> TranslateResult<QueryExpression> {
        if query.is_union() {
            return Err(UnsupportedConstruct::Union.into());
        }
        if query.body.from.is_join() {
            return Err(UnsupportedConstruct::Join.into());
        }
        if query.with_clause.is_some() {
            return Err(UnsupportedConstruct::MultipleCteElements.into());
        }

        let mut defining = parse_query(&self.defining_sql)?;
        if let Some(defining_where) = query.body.defining_where.take() {
            let inner = &mut defining.body;
            if !inner.group_by.is_empty() {
                return Err(UnsupportedConstruct::DefiningWhereWithGroupBy.into());
            }
            inner.where_clause = Some(match inner.where_clause.take() {
                Some(existing) => existing.parenthesized().and(defining_where.parenthesized()),
                None => defining_where,
            });
        }

        debug!(virtual_table = %self.id, defining_sql = %self.defining_sql, "rewriting query as CTE");
        let element = WithElement::new(naming::table_name(&self.id), defining);
        Ok(query.with_cte(WithClause { elements: vec![element] }))
    }
}

impl fmt::Debug for VirtualTableIndexDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualTableIndexDescription")
            .field("id", &self.id)
            .field("defining_sql", &self.defining_sql)
            .finish_non_exhaustive()
    }
}
