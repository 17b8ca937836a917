//! Query translation.
//!
//! A [`QueryTranslator`] compiles a query written against logical tables and
//! column names into SQL over the physical store, with its literals bound
//! as parameters.
//!
//! # Pipeline
//!
//! 1. The [`IndexDescription`] may rewrite the query (virtual tables become
//!    a CTE over their defining SQL, which is compiled first)
//! 2. Each query part binds its tables through a [`TableAndColumnMapper`]
//!    and `*` is expanded
//! 3. The output schema is derived, and from it the row size and page size
//! 4. Expressions are rewritten in textual order, binding `:b0`, `:b1`, ...
//! 5. Metadata columns (`ROW_ID`, `ROW_VERSION`, `ROW_ETAG`, benefactors) are
//!    appended to every part
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tablequery::{IndexDescription, QueryTranslator, TranslatorConfig};
//!
//! let translator = QueryTranslator::new(
//!     TranslatorConfig::new()
//!         .with_schema_provider(Arc::new(provider))
//!         .with_index_description(IndexDescription::table("syn123".parse()?))
//!         .with_user_id(1),
//! )?;
//! let translated = translator.translate("select foo from syn123 where bar = 1")?;
//! assert_eq!(translated.sql(), "SELECT _C111_, ROW_ID, ROW_VERSION FROM T123 WHERE _C222_ = :b0");
//! ```

mod config;
mod context;
pub mod expr;
pub mod pagination;
pub mod select;
pub mod types;

use std::sync::Arc;

use tablequery_core::size;
use tablequery_core::{ColumnModel, IdAndVersion, ParameterValue, SelectColumn};
use tracing::debug;

use crate::ast::{
    Expr, Identifier, Pagination, QueryExpression, QuerySpecification, SelectItem, SelectList,
    TableRef, WithClause, WithElement,
};
use crate::description::{IndexDescription, MetadataColumn};
use crate::error::{TranslateError, TranslateResult, UnsupportedConstruct};
use crate::mapper::{TableAndColumnMapper, TableInfo};
use crate::naming;
use crate::parser::parse_query;
use crate::schema::SchemaProvider;

pub use config::{SqlContext, TranslatorConfig};
pub use context::{Parameters, TranslationContext};
pub use expr::{ExprTranslator, Position};
pub use select::SelectAnalysis;
pub use types::TypeInference;

/// Whether a query is the statement itself or the defining query of a CTE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Outer,
    Inner,
}

/// The result of compiling one query expression.
#[derive(Debug, Clone)]
struct Compiled {
    query: QueryExpression,
    select_columns: Vec<SelectColumn>,
    schema_of_select: Vec<ColumnModel>,
    table_schema: Vec<ColumnModel>,
    table_ids: Vec<IdAndVersion>,
    single_table_id: Option<IdAndVersion>,
    is_aggregated: bool,
    includes_row_id_and_version: bool,
    includes_etag: bool,
    includes_search: bool,
    max_row_size_bytes: u64,
    max_rows_per_page: Option<u64>,
}

/// A query compiled to physical SQL.
#[derive(Debug, Clone)]
pub struct TranslatedQuery {
    compiled: Compiled,
    sql: String,
    parameters: Parameters,
}

impl TranslatedQuery {
    /// The physical SQL, with `:b{N}` placeholders.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The values bound to the placeholders.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The translated statement.
    #[must_use]
    pub const fn query(&self) -> &QueryExpression {
        &self.compiled.query
    }

    /// The output columns, in select-list order, without metadata columns.
    #[must_use]
    pub fn select_columns(&self) -> &[SelectColumn] {
        &self.compiled.select_columns
    }

    /// The output columns as descriptors, carrying ids and sizes.
    #[must_use]
    pub fn schema_of_select(&self) -> &[ColumnModel] {
        &self.compiled.schema_of_select
    }

    /// Every column of the queried tables, first occurrence wins.
    #[must_use]
    pub fn table_schema(&self) -> &[ColumnModel] {
        &self.compiled.table_schema
    }

    /// The tables read, including those read by a defining query.
    #[must_use]
    pub fn table_ids(&self) -> &[IdAndVersion] {
        &self.compiled.table_ids
    }

    /// The table read, when the statement reads exactly one and has no UNION.
    #[must_use]
    pub const fn single_table_id(&self) -> Option<IdAndVersion> {
        self.compiled.single_table_id
    }

    /// Returns `true` if rows do not map one-to-one to stored rows.
    #[must_use]
    pub const fn is_aggregated(&self) -> bool {
        self.compiled.is_aggregated
    }

    /// Returns `true` if `ROW_ID` and `ROW_VERSION` were appended.
    #[must_use]
    pub const fn includes_row_id_and_version(&self) -> bool {
        self.compiled.includes_row_id_and_version
    }

    /// Returns `true` if `ROW_ETAG` was appended.
    #[must_use]
    pub const fn includes_etag(&self) -> bool {
        self.compiled.includes_etag
    }

    /// Returns `true` if the query uses full-text search.
    #[must_use]
    pub const fn includes_search(&self) -> bool {
        self.compiled.includes_search
    }

    /// The largest number of bytes one output row can take.
    #[must_use]
    pub const fn max_row_size_bytes(&self) -> u64 {
        self.compiled.max_row_size_bytes
    }

    /// Rows per page under the configured byte budget, if one was given.
    #[must_use]
    pub const fn max_rows_per_page(&self) -> Option<u64> {
        self.compiled.max_rows_per_page
    }
}

/// Compiles table queries to physical SQL.
#[derive(Clone)]
pub struct QueryTranslator {
    schema_provider: Arc<dyn SchemaProvider>,
    index_description: IndexDescription,
    user_id: i64,
    context: SqlContext,
    include_entity_etag: bool,
    max_bytes_per_page: Option<u64>,
    override_offset: Option<u64>,
    override_limit: Option<u64>,
}

impl std::fmt::Debug for QueryTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTranslator")
            .field("index_description", &self.index_description)
            .field("user_id", &self.user_id)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl QueryTranslator {
    /// Validates `config` and creates a translator.
    ///
    /// # Errors
    ///
    /// Fails if the schema provider, index description or user id is missing.
    pub fn new(config: TranslatorConfig) -> TranslateResult<Self> {
        let schema_provider =
            config.schema_provider.ok_or(TranslateError::MissingInput("schemaProvider"))?;
        let index_description =
            config.index_description.ok_or(TranslateError::MissingInput("indexDescription"))?;
        let user_id = config.user_id.ok_or(TranslateError::MissingInput("userId"))?;
        Ok(Self {
            schema_provider,
            index_description,
            user_id,
            context: config.context,
            include_entity_etag: config.include_entity_etag,
            max_bytes_per_page: config.max_bytes_per_page,
            override_offset: config.override_offset,
            override_limit: config.override_limit,
        })
    }

    /// The description of what the translated queries read.
    #[must_use]
    pub const fn index_description(&self) -> &IndexDescription {
        &self.index_description
    }

    /// The provider of table schemas.
    #[must_use]
    pub fn schema_provider(&self) -> &dyn SchemaProvider {
        self.schema_provider.as_ref()
    }

    /// Parses and translates `sql`.
    ///
    /// # Errors
    ///
    /// Returns an error if `sql` does not parse or cannot be translated.
    pub fn translate(&self, sql: &str) -> TranslateResult<TranslatedQuery> {
        self.translate_query(parse_query(sql)?)
    }

    /// Translates a parsed query.
    ///
    /// # Errors
    ///
    /// Returns an error if a table or column does not resolve, or the query
    /// uses a construct its index description does not support.
    pub fn translate_query(&self, query: QueryExpression) -> TranslateResult<TranslatedQuery> {
        let mut ctx = TranslationContext::new(self.user_id);
        let compiled = self.compile(query, &self.index_description, Mode::Outer, &mut ctx)?;
        let parameters = ctx.into_parameters();
        let sql = compiled.query.to_string();
        debug!(
            tables = ?compiled.table_ids,
            aggregated = compiled.is_aggregated,
            parameters = parameters.len(),
            sql = %sql,
            "translated query"
        );
        Ok(TranslatedQuery { compiled, sql, parameters })
    }

    /// Compiles `query` against `description`. A virtual table stays on the
    /// context's chain while its definition compiles.
    fn compile(
        &self,
        query: QueryExpression,
        description: &IndexDescription,
        mode: Mode,
        ctx: &mut TranslationContext,
    ) -> TranslateResult<Compiled> {
        let IndexDescription::VirtualTable(virtual_table) = description else {
            return self.compile_expanded(query, description, mode, ctx);
        };
        ctx.enter_virtual_table(virtual_table.id())?;
        let compiled = self.compile_expanded(query, description, mode, ctx);
        ctx.leave_virtual_table();
        compiled
    }

    fn compile_expanded(
        &self,
        query: QueryExpression,
        description: &IndexDescription,
        mode: Mode,
        ctx: &mut TranslationContext,
    ) -> TranslateResult<Compiled> {
        let mut query = description.preprocess(query)?;
        if !description.supports_composition(self.context) {
            if query.is_union() {
                return Err(UnsupportedConstruct::Union.into());
            }
            if query.specifications().any(|spec| spec.from.is_join()) {
                return Err(UnsupportedConstruct::Join.into());
            }
        }

        let mut inner_ids = Vec::new();
        let mut inner_aggregated = false;
        if let Some(with_clause) = query.with_clause.take() {
            let (with_clause, ids, aggregated) = self.compile_cte(with_clause, description, ctx)?;
            query.with_clause = Some(with_clause);
            inner_ids = ids;
            inner_aggregated = aggregated;
        }

        let provider = self.schema_provider.as_ref();
        let mappers = query
            .specifications_mut()
            .map(|spec| {
                let mapper = TableAndColumnMapper::new(spec, provider)?;
                if spec.select_list == SelectList::Star {
                    spec.select_list = SelectList::Items(mapper.build_select_all_columns()?);
                }
                Ok(mapper)
            })
            .collect::<TranslateResult<Vec<_>>>()?;

        let mut table_ids: Vec<IdAndVersion> = Vec::new();
        for id in mappers.iter().flat_map(TableAndColumnMapper::table_ids).chain(inner_ids) {
            if !table_ids.contains(&id) {
                table_ids.push(id);
            }
        }
        let single_table_id = match mappers.as_slice() {
            [only] if only.tables().len() == 1 => only.tables().first().map(TableInfo::id),
            _ => None,
        };
        let is_aggregated =
            inner_aggregated || query.specifications().any(QuerySpecification::is_aggregate);

        let metadata = match mode {
            Mode::Outer => description.metadata_columns(
                self.context,
                self.include_entity_etag,
                is_aggregated,
                &table_ids,
            )?,
            Mode::Inner => Vec::new(),
        };

        let schema_of_select = select::widen_union(
            query
                .specifications()
                .zip(&mappers)
                .map(|(spec, mapper)| {
                    let analysis = SelectAnalysis::new(mapper, provider);
                    select_items(spec).iter().map(|item| analysis.describe(item)).collect::<Vec<_>>()
                })
                .collect(),
        );
        let max_row_size_bytes = size::max_row_size(&schema_of_select);
        let max_rows_per_page = match mode {
            Mode::Outer => {
                self.max_bytes_per_page.map(|budget| size::max_rows_per_page(budget, max_row_size_bytes))
            }
            Mode::Inner => None,
        };
        if mode == Mode::Outer {
            if let Some(last) = query.specifications_mut().last() {
                let requested = pagination::override_pagination(
                    last.pagination.take(),
                    self.override_offset,
                    self.override_limit,
                )?;
                last.pagination = pagination::limit_max_rows_per_page(requested, max_rows_per_page)?;
            }
        }

        let guard_doubles = mode == Mode::Outer && self.context == SqlContext::Query;
        let mut includes_search = false;
        for (spec, mapper) in query.specifications_mut().zip(&mappers) {
            includes_search |= self.rewrite_part(spec, mapper, &metadata, guard_doubles, ctx)?;
        }

        let mut table_schema: Vec<ColumnModel> = Vec::new();
        for model in mappers.iter().flat_map(TableAndColumnMapper::union_of_all_schemas) {
            if !table_schema.iter().any(|m| m.id() == model.id()) {
                table_schema.push(model);
            }
        }

        Ok(Compiled {
            query,
            select_columns: select::select_columns(&schema_of_select, is_aggregated),
            schema_of_select,
            table_schema,
            table_ids,
            single_table_id,
            is_aggregated,
            includes_row_id_and_version: metadata.contains(&MetadataColumn::RowId),
            includes_etag: metadata.contains(&MetadataColumn::RowEtag),
            includes_search,
            max_row_size_bytes,
            max_rows_per_page,
        })
    }

    /// Compiles the defining query of a CTE against the description of the
    /// table it reads, naming the CTE columns by their physical ids.
    fn compile_cte(
        &self,
        with_clause: WithClause,
        description: &IndexDescription,
        ctx: &mut TranslationContext,
    ) -> TranslateResult<(WithClause, Vec<IdAndVersion>, bool)> {
        let mut elements = with_clause.elements;
        let WithElement { name, query, .. } = match (elements.pop(), elements.is_empty()) {
            (Some(element), true) => element,
            _ => return Err(UnsupportedConstruct::MultipleCteElements.into()),
        };

        let inner_table: IdAndVersion = match query.body.from.tables().first() {
            Some(table) => table.name.parse()?,
            None => {
                return Err(TranslateError::Configuration(format!(
                    "The defining query of {name} reads no table"
                )))
            }
        };
        let inner_description = description.dependency_description(&inner_table)?;
        let inner = self.compile(*query, &inner_description, Mode::Inner, ctx)?;

        let columns = inner
            .schema_of_select
            .iter()
            .map(|model| {
                model.id().map(|id| Identifier::new(naming::column_name(id))).ok_or_else(|| {
                    TranslateError::Configuration(format!(
                        "Column '{}' of the defining query of {name} has no column id",
                        model.name()
                    ))
                })
            })
            .collect::<TranslateResult<_>>()?;
        let name = match name.name.parse::<IdAndVersion>() {
            Ok(id) => Identifier::new(naming::table_name(&id)),
            Err(_) => name,
        };
        let element = WithElement { name, columns, query: Box::new(inner.query) };
        Ok((WithClause { elements: vec![element] }, inner.table_ids, inner.is_aggregated))
    }

    /// Rewrites one query part in textual order: select list, join
    /// conditions, WHERE, GROUP BY, ORDER BY, then LIMIT and OFFSET.
    ///
    /// Returns `true` if the part uses full-text search.
    fn rewrite_part(
        &self,
        spec: &mut QuerySpecification,
        mapper: &TableAndColumnMapper,
        metadata: &[MetadataColumn],
        guard_doubles: bool,
        ctx: &mut TranslationContext,
    ) -> TranslateResult<bool> {
        let aliases = select_items(spec)
            .iter()
            .filter_map(|item| item.alias.as_ref().map(|alias| alias.name.clone()))
            .collect();
        let mut translator = ExprTranslator::new(mapper, self.schema_provider.as_ref(), guard_doubles)
            .with_select_aliases(aliases);

        let items = match std::mem::replace(&mut spec.select_list, SelectList::Star) {
            SelectList::Items(items) => items,
            SelectList::Star => Vec::new(),
        };
        let mut select = Vec::with_capacity(items.len() + metadata.len());
        for item in items {
            let expr = translator.rewrite(item.expr, Position::Select, ctx)?;
            select.push(SelectItem { expr, alias: item.alias.map(output_alias) });
        }
        select.extend(metadata.iter().map(|column| SelectItem::expr(metadata_expr(*column, mapper))));
        spec.select_list = SelectList::Items(select);

        mapper.translate_from(&mut spec.from);
        rewrite_join_conditions(&mut spec.from, &mut translator, ctx)?;

        if let Some(condition) = spec.where_clause.take() {
            spec.where_clause = Some(translator.rewrite(condition, Position::Condition(None), ctx)?);
        }
        spec.group_by = std::mem::take(&mut spec.group_by)
            .into_iter()
            .map(|key| translator.rewrite(key, Position::Sort, ctx))
            .collect::<TranslateResult<_>>()?;
        for order in &mut spec.order_by {
            let key = std::mem::replace(&mut order.expr, Expr::null());
            order.expr = translator.rewrite(key, Position::Sort, ctx)?;
        }
        if let Some(window) = spec.pagination.take() {
            spec.pagination = Some(bind_pagination(&window, ctx)?);
        }

        let from = std::mem::replace(&mut spec.from, TableRef::table(String::new()));
        spec.from = translator.join_unnested(from);
        Ok(translator.includes_search())
    }
}

fn select_items(spec: &QuerySpecification) -> &[SelectItem] {
    match &spec.select_list {
        SelectList::Items(items) => items,
        SelectList::Star => &[],
    }
}

/// Join conditions are rewritten innermost join first, which is their
/// textual order.
fn rewrite_join_conditions(
    from: &mut TableRef,
    translator: &mut ExprTranslator<'_>,
    ctx: &mut TranslationContext,
) -> TranslateResult<()> {
    if let TableRef::Join(join) = from {
        rewrite_join_conditions(&mut join.left, translator, ctx)?;
        let condition = std::mem::replace(&mut join.condition, Expr::null());
        join.condition = translator.rewrite(condition, Position::Condition(None), ctx)?;
    }
    Ok(())
}

/// Quoted aliases are back-quoted in the physical SQL.
fn output_alias(alias: Identifier) -> Identifier {
    if alias.is_delimited() {
        Identifier::backtick(alias.name)
    } else {
        alias
    }
}

fn metadata_expr(column: MetadataColumn, mapper: &TableAndColumnMapper) -> Expr {
    let qualifier = mapper.tables().first().and_then(TableInfo::translated_alias);
    match column {
        MetadataColumn::RowId => Expr::Column(naming::metadata_reference(qualifier, naming::ROW_ID)),
        MetadataColumn::RowVersion => {
            Expr::Column(naming::metadata_reference(qualifier, naming::ROW_VERSION))
        }
        MetadataColumn::RowEtag => Expr::Column(naming::metadata_reference(qualifier, naming::ROW_ETAG)),
        MetadataColumn::Benefactor(view) => match mapper.first_table(&view) {
            Some(table) => naming::benefactor_column(table.translated_alias()),
            None => Expr::number(-1),
        },
    }
}

fn bind_pagination(window: &Pagination, ctx: &mut TranslationContext) -> TranslateResult<Pagination> {
    let mut bind = |expr: &Expr| -> TranslateResult<Expr> {
        let value = pagination::pagination_value(expr)?;
        Ok(ctx.bind(ParameterValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))))
    };
    let limit = bind(&window.limit)?;
    let offset = window.offset.as_ref().map(&mut bind).transpose()?;
    Ok(Pagination { limit, offset })
}
