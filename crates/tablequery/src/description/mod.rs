//! Descriptions of what backs a query.
//!
//! An [`IndexDescription`] tells the translator how the queried object is
//! stored: which metadata columns to project, which other tables it depends on,
//! and whether the query must be rewritten before translation.
//!
//! - [`IndexDescription::Table`] - a plain table
//! - [`IndexDescription::View`] - an entity or submission view carrying a benefactor column
//! - [`IndexDescription::MaterializedView`] - a table built from a defining query over dependencies
//! - [`IndexDescription::VirtualTable`] - a named query evaluated on read as a CTE

mod virtual_table;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tablequery_core::{IdAndVersion, TableType};

use crate::ast::QueryExpression;
use crate::error::{TranslateError, TranslateResult, UnsupportedConstruct};
use crate::translate::SqlContext;

pub use virtual_table::VirtualTableIndexDescription;

/// Resolves the description of a table a virtual table depends on.
pub trait IndexDescriptionLookup: Send + Sync {
    /// Looks up the description of `table`.
    fn get_index_description(&self, table: &IdAndVersion) -> Option<IndexDescription>;
}

impl IndexDescriptionLookup for HashMap<IdAndVersion, IndexDescription> {
    fn get_index_description(&self, table: &IdAndVersion) -> Option<IndexDescription> {
        self.get(table).cloned()
    }
}

/// A metadata column appended to the select list of every query part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataColumn {
    /// `ROW_ID`.
    RowId,
    /// `ROW_VERSION`.
    RowVersion,
    /// `ROW_ETAG`.
    RowEtag,
    /// `IFNULL(ROW_BENEFACTOR,-1)` of the given view, or `-1` in parts that do
    /// not read it.
    Benefactor(IdAndVersion),
}

/// A plain table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIndexDescription {
    id: IdAndVersion,
}

impl TableIndexDescription {
    /// Creates the description of a table.
    #[must_use]
    pub const fn new(id: IdAndVersion) -> Self {
        Self { id }
    }
}

/// A view whose rows carry a benefactor column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewIndexDescription {
    id: IdAndVersion,
    table_type: TableType,
}

impl ViewIndexDescription {
    /// Creates the description of a view of the given type.
    #[must_use]
    pub const fn new(id: IdAndVersion, table_type: TableType) -> Self {
        Self { id, table_type }
    }
}

/// A table built from a defining query over other tables and views.
#[derive(Debug, Clone)]
pub struct MaterializedViewIndexDescription {
    id: IdAndVersion,
    dependencies: Vec<IndexDescription>,
}

impl MaterializedViewIndexDescription {
    /// Creates the description of a materialized view over `dependencies`.
    #[must_use]
    pub const fn new(id: IdAndVersion, dependencies: Vec<IndexDescription>) -> Self {
        Self { id, dependencies }
    }
}

/// What backs a query.
#[derive(Clone)]
pub enum IndexDescription {
    /// A plain table.
    Table(TableIndexDescription),
    /// An entity or submission view.
    View(ViewIndexDescription),
    /// A materialized view.
    MaterializedView(MaterializedViewIndexDescription),
    /// A virtual table.
    VirtualTable(VirtualTableIndexDescription),
}

impl IndexDescription {
    /// Describes a plain table.
    #[must_use]
    pub const fn table(id: IdAndVersion) -> Self {
        Self::Table(TableIndexDescription::new(id))
    }

    /// Describes a view of the given type.
    #[must_use]
    pub const fn view(id: IdAndVersion, table_type: TableType) -> Self {
        Self::View(ViewIndexDescription::new(id, table_type))
    }

    /// Describes a materialized view over `dependencies`.
    #[must_use]
    pub const fn materialized_view(id: IdAndVersion, dependencies: Vec<Self>) -> Self {
        Self::MaterializedView(MaterializedViewIndexDescription::new(id, dependencies))
    }

    /// Describes a virtual table defined by `defining_sql`.
    ///
    /// `lookup` resolves the description of the table the defining SQL reads.
    #[must_use]
    pub fn virtual_table(
        id: IdAndVersion,
        defining_sql: impl Into<String>,
        lookup: Arc<dyn IndexDescriptionLookup>,
    ) -> Self {
        Self::VirtualTable(VirtualTableIndexDescription::new(id, defining_sql, lookup))
    }

    /// The identifier of the described object.
    #[must_use]
    pub const fn id_and_version(&self) -> IdAndVersion {
        match self {
            Self::Table(d) => d.id,
            Self::View(d) => d.id,
            Self::MaterializedView(d) => d.id,
            Self::VirtualTable(d) => d.id(),
        }
    }

    /// The kind of the described object.
    #[must_use]
    pub const fn table_type(&self) -> TableType {
        match self {
            Self::Table(_) => TableType::Table,
            Self::View(d) => d.table_type,
            Self::MaterializedView(_) => TableType::MaterializedView,
            Self::VirtualTable(_) => TableType::VirtualTable,
        }
    }

    /// Returns `true` if rows of the described object carry a benefactor column.
    #[must_use]
    pub const fn has_benefactor_column(&self) -> bool {
        matches!(self, Self::View(_))
    }

    /// The descriptions this object is built from, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[Self] {
        match self {
            Self::MaterializedView(d) => &d.dependencies,
            _ => &[],
        }
    }

    /// Returns `true` if the query may join tables or combine parts with UNION
    /// in the given context.
    #[must_use]
    pub const fn supports_composition(&self, context: SqlContext) -> bool {
        matches!((self, context), (Self::MaterializedView(_), SqlContext::Build))
    }

    /// The metadata columns appended to every part of a query.
    ///
    /// `table_ids` are the tables of the whole statement in first-appearance
    /// order; in a build context each distinct one backed by a view contributes
    /// one benefactor column.
    ///
    /// # Errors
    ///
    /// Returns an error if an aggregated build query reads a view.
    pub fn metadata_columns(
        &self,
        context: SqlContext,
        include_etag: bool,
        is_aggregated: bool,
        table_ids: &[IdAndVersion],
    ) -> TranslateResult<Vec<MetadataColumn>> {
        match context {
            SqlContext::Query => {
                if is_aggregated || matches!(self, Self::VirtualTable(_)) {
                    return Ok(vec![]);
                }
                let mut columns = vec![MetadataColumn::RowId, MetadataColumn::RowVersion];
                if include_etag && self.table_type().is_view_entity_type() {
                    columns.push(MetadataColumn::RowEtag);
                }
                Ok(columns)
            }
            SqlContext::Build => {
                let benefactors: Vec<MetadataColumn> = match self {
                    Self::View(d) => vec![MetadataColumn::Benefactor(d.id)],
                    Self::MaterializedView(d) => table_ids
                        .iter()
                        .filter(|id| {
                            d.dependencies
                                .iter()
                                .any(|dep| dep.id_and_version() == **id && dep.has_benefactor_column())
                        })
                        .map(|id| MetadataColumn::Benefactor(*id))
                        .collect(),
                    Self::Table(_) | Self::VirtualTable(_) => vec![],
                };
                if is_aggregated && !benefactors.is_empty() {
                    return Err(UnsupportedConstruct::DefiningSqlWithGroupBy.into());
                }
                Ok(benefactors)
            }
        }
    }

    /// Rewrites `query` before translation.
    ///
    /// A virtual table wraps its defining SQL around the query as a CTE. Every
    /// other description returns the query unchanged, rejecting a
    /// `DEFINING_WHERE` it cannot apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the defining SQL does not parse or the query uses a
    /// construct the description cannot rewrite.
    pub fn preprocess(&self, query: QueryExpression) -> TranslateResult<QueryExpression> {
        match self {
            Self::VirtualTable(d) => d.preprocess(query),
            _ => {
                if query.specifications().any(|spec| spec.defining_where.is_some()) {
                    return Err(UnsupportedConstruct::DefiningWhere.into());
                }
                Ok(query)
            }
        }
    }

    /// The description to compile the inner query of a CTE against, given the
    /// table that inner query reads.
    ///
    /// # Errors
    ///
    /// Returns an error if a virtual table's lookup does not know `table`.
    pub fn dependency_description(&self, table: &IdAndVersion) -> TranslateResult<Self> {
        match self {
            Self::VirtualTable(d) => d.lookup(table),
            _ => Ok(Self::table(*table)),
        }
    }
}

impl fmt::Debug for IndexDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(d) => f.debug_tuple("Table").field(d).finish(),
            Self::View(d) => f.debug_tuple("View").field(d).finish(),
            Self::MaterializedView(d) => f.debug_tuple("MaterializedView").field(d).finish(),
            Self::VirtualTable(d) => f.debug_tuple("VirtualTable").field(d).finish(),
        }
    }
}

impl From<TableIndexDescription> for IndexDescription {
    fn from(d: TableIndexDescription) -> Self {
        Self::Table(d)
    }
}

impl From<ViewIndexDescription> for IndexDescription {
    fn from(d: ViewIndexDescription) -> Self {
        Self::View(d)
    }
}

impl From<MaterializedViewIndexDescription> for IndexDescription {
    fn from(d: MaterializedViewIndexDescription) -> Self {
        Self::MaterializedView(d)
    }
}

impl From<VirtualTableIndexDescription> for IndexDescription {
    fn from(d: VirtualTableIndexDescription) -> Self {
        Self::VirtualTable(d)
    }
}

/// The error for a table without a registered description.
pub(crate) fn missing_description(table: &IdAndVersion) -> TranslateError {
    TranslateError::Configuration(format!("No index description found for {table}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_query;

    fn syn(id: u64) -> IdAndVersion {
        IdAndVersion::new(id)
    }

    #[test]
    fn table_type_and_benefactor() {
        assert_eq!(IndexDescription::table(syn(1)).table_type(), TableType::Table);
        let view = IndexDescription::view(syn(2), TableType::EntityView);
        assert_eq!(view.table_type(), TableType::EntityView);
        assert!(view.has_benefactor_column());
        assert!(!IndexDescription::table(syn(1)).has_benefactor_column());
    }

    #[test]
    fn query_context_metadata() {
        let table = IndexDescription::table(syn(1));
        assert_eq!(
            table.metadata_columns(SqlContext::Query, true, false, &[syn(1)]).unwrap(),
            vec![MetadataColumn::RowId, MetadataColumn::RowVersion]
        );
        assert!(table.metadata_columns(SqlContext::Query, false, true, &[syn(1)]).unwrap().is_empty());

        let view = IndexDescription::view(syn(2), TableType::EntityView);
        assert_eq!(
            view.metadata_columns(SqlContext::Query, true, false, &[syn(2)]).unwrap(),
            vec![MetadataColumn::RowId, MetadataColumn::RowVersion, MetadataColumn::RowEtag]
        );
        assert_eq!(
            view.metadata_columns(SqlContext::Query, false, false, &[syn(2)]).unwrap(),
            vec![MetadataColumn::RowId, MetadataColumn::RowVersion]
        );
    }

    #[test]
    fn build_context_benefactors_follow_statement_order() {
        let mv = IndexDescription::materialized_view(
            syn(3),
            vec![
                IndexDescription::view(syn(2), TableType::EntityView),
                IndexDescription::table(syn(4)),
                IndexDescription::view(syn(1), TableType::EntityView),
            ],
        );
        let columns = mv.metadata_columns(SqlContext::Build, false, false, &[syn(1), syn(4), syn(2)]);
        assert_eq!(
            columns.unwrap(),
            vec![MetadataColumn::Benefactor(syn(1)), MetadataColumn::Benefactor(syn(2))]
        );
    }

    #[test]
    fn build_context_aggregate_over_view_is_rejected() {
        let mv = IndexDescription::materialized_view(
            syn(3),
            vec![IndexDescription::view(syn(1), TableType::EntityView)],
        );
        let err = mv.metadata_columns(SqlContext::Build, false, true, &[syn(1)]).unwrap_err();
        assert_eq!(err, TranslateError::Unsupported(UnsupportedConstruct::DefiningSqlWithGroupBy));

        let over_table =
            IndexDescription::materialized_view(syn(3), vec![IndexDescription::table(syn(1))]);
        assert!(over_table.metadata_columns(SqlContext::Build, false, true, &[syn(1)]).unwrap().is_empty());
    }

    #[test]
    fn composition_only_for_materialized_views_in_build() {
        let mv = IndexDescription::materialized_view(syn(3), vec![]);
        assert!(mv.supports_composition(SqlContext::Build));
        assert!(!mv.supports_composition(SqlContext::Query));
        assert!(!IndexDescription::table(syn(1)).supports_composition(SqlContext::Build));
    }

    #[test]
    fn defining_where_requires_virtual_table() {
        let query = parse_query("select * from syn1 defining_where foo > 1").unwrap();
        let err = IndexDescription::table(syn(1)).preprocess(query).unwrap_err();
        assert_eq!(err, TranslateError::Unsupported(UnsupportedConstruct::DefiningWhere));
    }

    #[test]
    fn plain_preprocess_is_identity() {
        let query = parse_query("select foo from syn1 where bar = 1").unwrap();
        let processed = IndexDescription::table(syn(1)).preprocess(query.clone()).unwrap();
        assert_eq!(processed, query);
    }

    #[test]
    fn dependency_of_plain_description_is_a_table() {
        let dep = IndexDescription::table(syn(1)).dependency_description(&syn(7)).unwrap();
        assert_eq!(dep.id_and_version(), syn(7));
        assert_eq!(dep.table_type(), TableType::Table);
    }
}
