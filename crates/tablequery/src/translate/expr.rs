//! Rewriting of logical expressions into physical ones.
//!
//! Column names become `_C{id}_` references, literals in predicates become
//! bound parameters, and the dialect's extensions (`HAS`, `UNNEST`, `isNaN`,
//! `TEXT_MATCHES`) expand into plain SQL over the backing store.

use tablequery_core::{ColumnId, ColumnType, IdAndVersion, ParameterValue};

use crate::ast::{
    BinaryOp, BooleanFunction, CaseExpr, CastTarget, ColumnReference, Expr, Identifier, JoinClause, JoinType,
    Literal, QueryExpression, QuerySpecification, SelectItem, SelectList, TableName, TableRef,
    UnaryOp,
};
use crate::error::{TranslateError, TranslateResult};
use crate::mapper::TableAndColumnMapper;
use crate::naming;
use crate::schema::SchemaProvider;

use super::context::TranslationContext;
use super::types::TypeInference;

/// Where an expression appears, which decides how its leaves are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// A select item outside any function call. DOUBLE columns may be read
    /// through their shadow column.
    Select,
    /// A function or CAST argument. Literals stay inline.
    Argument,
    /// A search condition. Literals are bound, typed by the hint when given.
    Condition(Option<ColumnType>),
    /// A GROUP BY or ORDER BY key. Select aliases may be referenced.
    Sort,
}

impl Position {
    /// The position with a new type hint, for conditions.
    const fn hinted(self, hint: Option<ColumnType>) -> Self {
        match self {
            Self::Condition(_) => Self::Condition(hint),
            other => other,
        }
    }

    const fn is_condition(self) -> bool {
        matches!(self, Self::Condition(_))
    }
}

/// A list column read through its side table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListColumn {
    table: IdAndVersion,
    owner: String,
    qualifier: Option<String>,
    id: ColumnId,
    element_type: ColumnType,
}

/// Rewrites the expressions of one query specification.
pub struct ExprTranslator<'a> {
    mapper: &'a TableAndColumnMapper,
    provider: &'a dyn SchemaProvider,
    guard_doubles: bool,
    select_aliases: Vec<String>,
    unnested: Vec<ListColumn>,
    includes_search: bool,
}

impl<'a> ExprTranslator<'a> {
    /// Creates a translator over the tables bound by `mapper`.
    ///
    /// With `guard_doubles`, DOUBLE columns in [`Position::Select`] read
    /// their shadow column.
    #[must_use]
    pub fn new(
        mapper: &'a TableAndColumnMapper,
        provider: &'a dyn SchemaProvider,
        guard_doubles: bool,
    ) -> Self {
        Self {
            mapper,
            provider,
            guard_doubles,
            select_aliases: Vec::new(),
            unnested: Vec::new(),
            includes_search: false,
        }
    }

    /// Sets the aliases of the select list, which sort keys may reference.
    #[must_use]
    pub fn with_select_aliases(mut self, aliases: Vec<String>) -> Self {
        self.select_aliases = aliases;
        self
    }

    /// Returns `true` if a `TEXT_MATCHES` was rewritten.
    #[must_use]
    pub const fn includes_search(&self) -> bool {
        self.includes_search
    }

    fn types(&self) -> TypeInference<'a> {
        TypeInference::new(self.mapper, self.provider)
    }

    /// Rewrites `expr`, binding literals into `ctx` in visiting order.
    ///
    /// # Errors
    ///
    /// Returns an error if a name does not resolve or an extension is used on
    /// a column of the wrong type.
    pub fn rewrite(
        &mut self,
        expr: Expr,
        position: Position,
        ctx: &mut TranslationContext,
    ) -> TranslateResult<Expr> {
        match expr {
            Expr::Literal(literal) => Ok(bind_literal(literal, position, ctx)),
            Expr::Column(column) => self.column(column, position),
            Expr::Parameter(_) | Expr::Wildcard => Ok(expr),
            Expr::CurrentUser => {
                let user_id = ctx.user_id();
                Ok(if position.is_condition() {
                    ctx.bind(ParameterValue::Integer(user_id))
                } else {
                    Expr::number(user_id)
                })
            }
            Expr::Function(mut func) => {
                func.args = self.rewrite_all(func.args, Position::Argument, ctx)?;
                Ok(Expr::Function(func))
            }
            Expr::Cast { expr, target } => {
                let expr = self.rewrite(*expr, Position::Argument, ctx)?;
                Ok(Expr::Cast { expr: Box::new(expr), target: self.cast_target(target)? })
            }
            Expr::Case(case) => self.case(case, position, ctx),
            Expr::BinaryOp { left, op, right } => {
                let logical = matches!(op, BinaryOp::And | BinaryOp::Or);
                let (left_hint, right_hint) = if position.is_condition() && !logical {
                    let types = self.types();
                    (types.infer(&right), types.infer(&left))
                } else {
                    (None, None)
                };
                let left = self.rewrite(*left, position.hinted(left_hint), ctx)?;
                let right = self.rewrite(*right, position.hinted(right_hint), ctx)?;
                Ok(Expr::binary(left, op, right))
            }
            Expr::UnaryOp { op, operand } => {
                let position = if op == UnaryOp::Not { position.hinted(None) } else { position };
                Ok(Expr::unary(op, self.rewrite(*operand, position, ctx)?))
            }
            Expr::Nested(inner) => Ok(self.rewrite(*inner, position, ctx)?.nested()),
            Expr::IsNull { expr, negated } => {
                let expr = self.rewrite(*expr, position.hinted(None), ctx)?;
                Ok(Expr::IsNull { expr: Box::new(expr), negated })
            }
            Expr::IsBoolean { expr, value, negated } => {
                let expr = self.rewrite(*expr, position.hinted(None), ctx)?;
                Ok(Expr::IsBoolean { expr: Box::new(expr), value, negated })
            }
            Expr::Between { expr, low, high, negated } => {
                let types = self.types();
                let tested_type = types.infer(&expr);
                let bound_type = types.infer(&low).or_else(|| types.infer(&high));
                let expr = self.rewrite(*expr, position.hinted(bound_type), ctx)?;
                let low = self.rewrite(*low, position.hinted(tested_type), ctx)?;
                let high = self.rewrite(*high, position.hinted(tested_type), ctx)?;
                Ok(Expr::Between { expr: Box::new(expr), low: Box::new(low), high: Box::new(high), negated })
            }
            Expr::InList { expr, list, negated } => {
                let types = self.types();
                let tested_type = types.infer(&expr);
                let value_type = list.iter().find_map(|v| types.infer(v));
                let expr = self.rewrite(*expr, position.hinted(value_type), ctx)?;
                let list = self.rewrite_all(list, position.hinted(tested_type), ctx)?;
                Ok(Expr::InList { expr: Box::new(expr), list, negated })
            }
            Expr::InSubquery { .. } => {
                Err(TranslateError::InvalidOperand("Subqueries are not supported".to_string()))
            }
            Expr::Like { expr, pattern, escape, negated } => {
                let types = self.types();
                let tested_type = types.infer(&expr);
                let pattern_type = types.infer(&pattern);
                let expr = self.rewrite(*expr, position.hinted(pattern_type), ctx)?;
                let pattern = self.rewrite(*pattern, position.hinted(tested_type), ctx)?;
                let escape = match escape {
                    Some(escape) => {
                        Some(Box::new(self.rewrite(*escape, position.hinted(Some(ColumnType::String)), ctx)?))
                    }
                    None => None,
                };
                Ok(Expr::Like { expr: Box::new(expr), pattern: Box::new(pattern), escape, negated })
            }
            Expr::Has { expr, list, like, negated } => self.has(*expr, list, like, negated, ctx),
            Expr::BooleanFunction { function, column } => self.boolean_function(function, &column),
            Expr::TextMatches(text) | Expr::MatchAgainst(text) => {
                let text = self.rewrite(*text, Position::Condition(Some(ColumnType::String)), ctx)?;
                self.includes_search = true;
                Ok(Expr::MatchAgainst(Box::new(text)))
            }
            Expr::Unnest(column) => self.unnest(&column),
        }
    }

    fn rewrite_all(
        &mut self,
        exprs: Vec<Expr>,
        position: Position,
        ctx: &mut TranslationContext,
    ) -> TranslateResult<Vec<Expr>> {
        exprs.into_iter().map(|e| self.rewrite(e, position, ctx)).collect()
    }

    fn column(&self, column: ColumnReference, position: Position) -> TranslateResult<Expr> {
        let Some(resolved) = self.mapper.resolve(&column)? else {
            return self.unresolved(column, position);
        };
        if position == Position::Select && self.guard_doubles {
            if let Some(schema) = resolved.schema_column() {
                if schema.model.column_type() == ColumnType::Double {
                    return Ok(naming::double_guard(resolved.qualifier(), schema.id));
                }
            }
        }
        Ok(Expr::Column(resolved.physical_reference()))
    }

    /// A name that matches no column may still be a select alias in a sort
    /// key, or a quoted name the store resolves itself.
    fn unresolved(&self, column: ColumnReference, position: Position) -> TranslateResult<Expr> {
        let bare = column.qualifier.is_none();
        let delimited = bare && column.name.is_delimited();
        let is_alias = bare && self.select_aliases.iter().any(|a| *a == column.name.name);
        match position {
            Position::Sort if is_alias || delimited => Ok(alias_reference(column)),
            Position::Condition(_) if delimited => Ok(alias_reference(column)),
            _ => Err(TranslateError::ColumnDoesNotExist(column.unquoted_text())),
        }
    }

    fn cast_target(&self, target: CastTarget) -> TranslateResult<CastTarget> {
        match target {
            CastTarget::Type(column_type) => {
                Ok(CastTarget::Physical(column_type.physical_cast_type().to_string()))
            }
            CastTarget::ColumnId(id) => self
                .provider
                .get_column_model(id)
                .map(|model| CastTarget::Physical(model.column_type().physical_cast_type().to_string()))
                .ok_or_else(|| TranslateError::ColumnDoesNotExist(id.to_string())),
            physical @ CastTarget::Physical(_) => Ok(physical),
        }
    }

    fn case(
        &mut self,
        case: CaseExpr,
        position: Position,
        ctx: &mut TranslationContext,
    ) -> TranslateResult<Expr> {
        let operand_type = case.operand.as_deref().and_then(|o| self.types().infer(o));
        let operand = match case.operand {
            Some(operand) => Some(Box::new(self.rewrite(*operand, position.hinted(None), ctx)?)),
            None => None,
        };
        let mut when_clauses = Vec::with_capacity(case.when_clauses.len());
        for (when, then) in case.when_clauses {
            let when = self.rewrite(when, position.hinted(operand_type), ctx)?;
            let then = self.rewrite(then, position, ctx)?;
            when_clauses.push((when, then));
        }
        let else_result = match case.else_result {
            Some(else_result) => Some(Box::new(self.rewrite(*else_result, position, ctx)?)),
            None => None,
        };
        Ok(Expr::Case(CaseExpr { operand, when_clauses, else_result }))
    }

    fn list_column(&self, column: &ColumnReference, function: &str) -> TranslateResult<ListColumn> {
        let resolved = self.mapper.resolve_required(column)?;
        let Some(schema) = resolved.schema_column() else {
            return Err(TranslateError::InvalidOperand(format!(
                "{function} may only be used on columns defined in the schema"
            )));
        };
        let column_type = schema.model.column_type();
        if !column_type.is_list() {
            return Err(TranslateError::InvalidOperand(format!(
                "{function} only works for columns that hold list values"
            )));
        }
        let qualifier = resolved.qualifier().map(str::to_string);
        Ok(ListColumn {
            table: resolved.table.id(),
            owner: qualifier.clone().unwrap_or_else(|| resolved.table.physical_name()),
            qualifier,
            id: schema.id,
            element_type: column_type.non_list_type(),
        })
    }

    /// `col [NOT] HAS ( a, b )` becomes
    /// `ROW_ID [NOT] IN ( SELECT ROW_ID_REF_C{id}_ FROM T{t}_INDEX_C{id}_ WHERE _C{id}__UNNEST IN ( a, b ) )`.
    fn has(
        &mut self,
        expr: Expr,
        list: Vec<Expr>,
        like: bool,
        negated: bool,
        ctx: &mut TranslationContext,
    ) -> TranslateResult<Expr> {
        let keyword = if like { "The HAS_LIKE keyword" } else { "The HAS keyword" };
        let Expr::Column(column) = expr else {
            return Err(TranslateError::InvalidOperand(format!(
                "{keyword} only works for columns that hold list values"
            )));
        };
        let list_column = self.list_column(&column, keyword)?;
        let values = self.rewrite_all(list, Position::Condition(Some(list_column.element_type)), ctx)?;

        let unnested = Expr::column(naming::unnested_column_name(list_column.id));
        let condition = if like {
            values
                .into_iter()
                .map(|value| Expr::Like {
                    expr: Box::new(unnested.clone()),
                    pattern: Box::new(value),
                    escape: None,
                    negated: false,
                })
                .reduce(Expr::or)
                .ok_or_else(|| TranslateError::InvalidOperand(format!("{keyword} requires at least one value")))?
        } else {
            Expr::InList { expr: Box::new(unnested), list: values, negated: false }
        };

        let lookup = QuerySpecification::new(
            SelectList::Items(vec![SelectItem::expr(Expr::column(naming::row_id_ref_column_name(
                list_column.id,
            )))]),
            TableRef::table(naming::list_index_table_name(&list_column.table, list_column.id)),
        )
        .where_clause(condition);
        let row_id = naming::metadata_reference(list_column.qualifier.as_deref(), naming::ROW_ID);
        Ok(Expr::InSubquery {
            expr: Box::new(Expr::Column(row_id)),
            subquery: Box::new(QueryExpression::new(lookup)),
            negated,
        })
    }

    /// `UNNEST(col)` becomes `_C{id}__UNNEST`, read from a side table joined
    /// once per column.
    fn unnest(&mut self, column: &ColumnReference) -> TranslateResult<Expr> {
        let list_column = self.list_column(column, "UNNEST()")?;
        let id = list_column.id;
        if !self.unnested.contains(&list_column) {
            self.unnested.push(list_column);
        }
        Ok(Expr::column(naming::unnested_column_name(id)))
    }

    fn boolean_function(&self, function: BooleanFunction, column: &ColumnReference) -> TranslateResult<Expr> {
        let resolved = self.mapper.resolve_required(column)?;
        match resolved.schema_column() {
            Some(schema) if schema.model.column_type() == ColumnType::Double => Ok(match function {
                BooleanFunction::IsNaN => naming::is_nan(resolved.qualifier(), schema.id),
                BooleanFunction::IsInfinity => naming::is_infinity(resolved.qualifier(), schema.id),
            }),
            _ => Err(TranslateError::InvalidOperand(format!(
                "Function: {function} can only be used with a column of type DOUBLE."
            ))),
        }
    }

    /// Chains a `LEFT JOIN` onto `from` for every unnested list column.
    #[must_use]
    pub fn join_unnested(&self, from: TableRef) -> TableRef {
        self.unnested.iter().fold(from, |left, column| {
            let index_table = naming::list_index_table_name(&column.table, column.id);
            let condition = Expr::Column(naming::metadata_reference(Some(column.owner.as_str()), naming::ROW_ID)).eq(
                Expr::Column(ColumnReference::qualified(
                    index_table.clone(),
                    naming::row_id_ref_column_name(column.id),
                )),
            );
            TableRef::Join(Box::new(JoinClause::new(left, JoinType::Left, TableName::new(index_table), condition)))
        })
    }
}

/// Binds a literal in a condition; elsewhere literals stay inline.
fn bind_literal(literal: Literal, position: Position, ctx: &mut TranslationContext) -> Expr {
    let Position::Condition(hint) = position else {
        return Expr::Literal(literal);
    };
    match literal {
        Literal::Number(text) => ctx.bind(match hint {
            Some(column_type) => ParameterValue::parse_for_type(column_type, &text),
            None => number_value(&text),
        }),
        Literal::String(text) => ctx.bind(match hint {
            Some(column_type) => ParameterValue::parse_for_type(column_type, &text),
            None => ParameterValue::String(text),
        }),
        other => Expr::Literal(other),
    }
}

fn number_value(text: &str) -> ParameterValue {
    text.parse::<i64>()
        .map(ParameterValue::Integer)
        .or_else(|_| text.parse::<f64>().map(ParameterValue::Double))
        .unwrap_or_else(|_| ParameterValue::String(text.to_string()))
}

/// A reference the store resolves by name; quoted names are back-quoted.
fn alias_reference(column: ColumnReference) -> Expr {
    if column.name.is_delimited() {
        Expr::column(Identifier::backtick(column.name.name))
    } else {
        Expr::Column(column)
    }
}
