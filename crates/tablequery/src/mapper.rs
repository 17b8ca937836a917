//! Binding of table references to schemas.
//!
//! A [`TableAndColumnMapper`] is built for one query specification. It loads
//! the schema of every table in the FROM clause, assigns the `_A{n}` aliases
//! used when more than one table participates, and resolves column references
//! to schema or metadata columns.

use tablequery_core::{ColumnId, ColumnModel, ColumnType, IdAndVersion};
use tracing::trace;

use crate::ast::{ColumnReference, Expr, Identifier, QuerySpecification, SelectItem, TableRef};
use crate::error::{TranslateError, TranslateResult};
use crate::naming;
use crate::schema::SchemaProvider;

/// A schema column with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedColumn {
    /// The column id.
    pub id: ColumnId,
    /// The full descriptor.
    pub model: ColumnModel,
}

/// One table of a FROM clause.
#[derive(Debug, Clone)]
pub struct TableInfo {
    id: IdAndVersion,
    original_name: String,
    alias: Option<Identifier>,
    translated_alias: Option<String>,
    columns: Vec<MappedColumn>,
}

impl TableInfo {
    /// The table identifier.
    #[must_use]
    pub const fn id(&self) -> IdAndVersion {
        self.id
    }

    /// The alias written by the user, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&Identifier> {
        self.alias.as_ref()
    }

    /// The `_A{n}` alias, present only when several tables participate.
    #[must_use]
    pub fn translated_alias(&self) -> Option<&str> {
        self.translated_alias.as_deref()
    }

    /// The physical table name.
    #[must_use]
    pub fn physical_name(&self) -> String {
        naming::table_name(&self.id)
    }

    /// The schema columns, in schema order.
    #[must_use]
    pub fn columns(&self) -> &[MappedColumn] {
        &self.columns
    }

    fn matches_qualifier(&self, qualifier: &Identifier) -> bool {
        match &self.alias {
            Some(alias) => alias.name == qualifier.name,
            None => self.original_name == qualifier.name,
        }
    }

    fn find(&self, name: &str) -> Option<&MappedColumn> {
        self.columns.iter().find(|c| c.model.name() == name)
    }
}

/// What a column reference resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnTarget<'a> {
    /// A column of the table schema.
    Schema(&'a MappedColumn),
    /// One of the metadata columns every table carries.
    Metadata(&'static str),
}

/// A resolved column reference.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColumn<'a> {
    /// The table the column belongs to.
    pub table: &'a TableInfo,
    /// The column.
    pub target: ColumnTarget<'a>,
}

impl<'a> ResolvedColumn<'a> {
    /// The logical type of the column.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        match self.target {
            ColumnTarget::Schema(column) => column.model.column_type(),
            ColumnTarget::Metadata(naming::ROW_ETAG) => ColumnType::String,
            ColumnTarget::Metadata(_) => ColumnType::Integer,
        }
    }

    /// The schema column, if this is not a metadata column.
    #[must_use]
    pub const fn schema_column(&self) -> Option<&'a MappedColumn> {
        match self.target {
            ColumnTarget::Schema(column) => Some(column),
            ColumnTarget::Metadata(_) => None,
        }
    }

    /// The qualifier physical references to this column need.
    #[must_use]
    pub fn qualifier(&self) -> Option<&'a str> {
        self.table.translated_alias()
    }

    /// The physical reference: `_C{id}_`, `_A{n}._C{id}_` or a metadata name.
    #[must_use]
    pub fn physical_reference(&self) -> ColumnReference {
        match self.target {
            ColumnTarget::Schema(column) => naming::column_reference(self.qualifier(), column.id),
            ColumnTarget::Metadata(name) => naming::metadata_reference(self.qualifier(), name),
        }
    }
}

/// Resolves the tables and columns of one query specification.
#[derive(Debug, Clone)]
pub struct TableAndColumnMapper {
    tables: Vec<TableInfo>,
}

impl TableAndColumnMapper {
    /// Loads the schema of every table in the FROM clause of `spec`.
    ///
    /// When more than one table participates each gets an `_A{n}` alias in
    /// FROM-clause order, even if the same table appears twice.
    ///
    /// # Errors
    ///
    /// Returns an error if a table name is not a table identifier or a schema
    /// column has no id.
    pub fn new(spec: &QuerySpecification, provider: &dyn SchemaProvider) -> TranslateResult<Self> {
        let table_names = spec.from.tables();
        let multiple = table_names.len() > 1;
        let mut tables = Vec::with_capacity(table_names.len());
        for (index, table) in table_names.into_iter().enumerate() {
            let id: IdAndVersion = table.name.parse()?;
            let columns = provider
                .get_table_schema(&id)
                .into_iter()
                .map(|model| match model.id() {
                    Some(column_id) => Ok(MappedColumn { id: column_id, model }),
                    None => Err(TranslateError::Configuration(format!(
                        "Column '{}' of {id} has no id",
                        model.name()
                    ))),
                })
                .collect::<TranslateResult<Vec<_>>>()?;
            tables.push(TableInfo {
                id,
                original_name: table.name.clone(),
                alias: table.alias.clone(),
                translated_alias: multiple.then(|| naming::table_alias(index)),
                columns,
            });
        }
        Ok(Self { tables })
    }

    /// The tables, in FROM-clause order.
    #[must_use]
    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    /// Returns `true` if more than one table participates.
    #[must_use]
    pub fn is_multi_table(&self) -> bool {
        self.tables.len() > 1
    }

    /// The distinct table identifiers, in first-appearance order.
    #[must_use]
    pub fn table_ids(&self) -> Vec<IdAndVersion> {
        let mut ids: Vec<IdAndVersion> = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            if !ids.contains(&table.id) {
                ids.push(table.id);
            }
        }
        ids
    }

    /// The first table with the given identifier.
    #[must_use]
    pub fn first_table(&self, id: &IdAndVersion) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.id == *id)
    }

    /// Every participating column, first occurrence wins.
    #[must_use]
    pub fn union_of_all_schemas(&self) -> Vec<ColumnModel> {
        let mut seen: Vec<ColumnId> = Vec::new();
        let mut columns = Vec::new();
        for column in self.tables.iter().flat_map(|t| &t.columns) {
            if !seen.contains(&column.id) {
                seen.push(column.id);
                columns.push(column.model.clone());
            }
        }
        columns
    }

    /// Expands `*` into one reference per schema column, table by table.
    ///
    /// References are qualified when the table has an alias or several
    /// tables participate, so the select columns read `a.foo`.
    ///
    /// # Errors
    ///
    /// Returns an error if no participating table has a schema.
    pub fn build_select_all_columns(&self) -> TranslateResult<Vec<SelectItem>> {
        if self.tables.iter().all(|t| t.columns.is_empty()) {
            let table = self.tables.first().map_or_else(String::new, |t| t.id.to_string());
            return Err(TranslateError::UnknownTable(table));
        }
        let multiple = self.is_multi_table();
        let items = self
            .tables
            .iter()
            .flat_map(|table| {
                let qualifier = match &table.alias {
                    Some(alias) => Some(alias.clone()),
                    None if multiple => Some(Identifier::new(table.original_name.clone())),
                    None => None,
                };
                table.columns.iter().map(move |column| {
                    let name = Identifier::quoted(column.model.name(), '"');
                    SelectItem::expr(Expr::Column(ColumnReference { qualifier: qualifier.clone(), name }))
                })
            })
            .collect();
        Ok(items)
    }

    /// Resolves a column reference.
    ///
    /// A qualifier selects the table by alias, or by name when it has none.
    /// An unqualified name must match exactly one table. Metadata columns
    /// resolve when no schema column has the name.
    ///
    /// # Errors
    ///
    /// Returns an error if an unqualified name matches more than one table.
    pub fn resolve(&self, column: &ColumnReference) -> TranslateResult<Option<ResolvedColumn<'_>>> {
        let name = column.name.name.as_str();
        let candidates: Vec<&TableInfo> = match &column.qualifier {
            Some(qualifier) => self.tables.iter().filter(|t| t.matches_qualifier(qualifier)).collect(),
            None => self.tables.iter().collect(),
        };

        let mut matches = candidates.iter().filter_map(|&table| {
            table.find(name).map(|c| ResolvedColumn { table, target: ColumnTarget::Schema(c) })
        });
        let resolved = match (matches.next(), matches.next()) {
            (Some(_), Some(_)) => {
                return Err(TranslateError::AmbiguousColumn(column.unquoted_text()));
            }
            (Some(found), None) => Some(found),
            (None, _) => metadata_name(name).and_then(|metadata| {
                candidates
                    .first()
                    .copied()
                    .map(|table| ResolvedColumn { table, target: ColumnTarget::Metadata(metadata) })
            }),
        };
        trace!(column = %column, resolved = resolved.is_some(), "resolved column reference");
        Ok(resolved)
    }

    /// Resolves a column reference, failing when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is ambiguous or matches nothing.
    pub fn resolve_required(&self, column: &ColumnReference) -> TranslateResult<ResolvedColumn<'_>> {
        self.resolve(column)?
            .ok_or_else(|| TranslateError::ColumnDoesNotExist(column.unquoted_text()))
    }

    /// Rewrites the tables of a FROM clause to physical names and aliases.
    pub fn translate_from(&self, from: &mut TableRef) {
        for (table, info) in from.tables_mut().into_iter().zip(&self.tables) {
            table.name = info.physical_name();
            table.alias = info.translated_alias.clone().map(Identifier::new);
        }
    }
}

fn metadata_name(name: &str) -> Option<&'static str> {
    [naming::ROW_ID, naming::ROW_VERSION, naming::ROW_ETAG, naming::ROW_BENEFACTOR]
        .into_iter()
        .find(|m| m.eq_ignore_ascii_case(name))
}
