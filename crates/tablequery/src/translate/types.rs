//! Type inference over logical expressions.
//!
//! Types are inferred before names are rewritten, so column references are
//! resolved through the mapper. An expression whose type cannot be known
//! (a NULL literal, an unknown function) infers `None`.

use tablequery_core::ColumnType;

use crate::ast::{CastTarget, Expr, Literal, UnaryOp};
use crate::mapper::TableAndColumnMapper;
use crate::schema::SchemaProvider;

/// Functions returning text.
const STRING_FUNCTIONS: &[&str] = &[
    "CONCAT",
    "GROUP_CONCAT",
    "JSON_EXTRACT",
    "JSON_UNQUOTE",
    "LOWER",
    "UPPER",
    "TRIM",
    "REPLACE",
    "SUBSTRING",
    "LEFT",
    "RIGHT",
    "DATE_FORMAT",
];

/// Functions returning integers.
const INTEGER_FUNCTIONS: &[&str] =
    &["COUNT", "UNIX_TIMESTAMP", "LENGTH", "CHAR_LENGTH", "DAYOFMONTH", "DAYOFWEEK", "DAYOFYEAR", "MONTH", "YEAR"];

/// Functions returning dates.
const DATE_FUNCTIONS: &[&str] = &["NOW", "CURRENT_TIMESTAMP", "FROM_UNIXTIME"];

/// Functions returning JSON documents.
const JSON_FUNCTIONS: &[&str] = &["JSON_OBJECT", "JSON_ARRAY", "JSON_ARRAYAGG"];

/// Functions returning booleans.
const BOOLEAN_FUNCTIONS: &[&str] = &["JSON_OVERLAPS", "JSON_CONTAINS"];

/// Functions whose type is that of their first argument.
const PRESERVING_FUNCTIONS: &[&str] = &["SUM", "MIN", "MAX", "ROUND", "ABS", "FLOOR", "CEIL"];

/// Functions whose type unifies the types of their arguments.
const UNIFYING_FUNCTIONS: &[&str] = &["NULLIF", "IFNULL", "COALESCE"];

fn listed(names: &[&str], name: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// Unifies branch types: the shared type when all known branches agree,
/// otherwise STRING.
#[must_use]
pub fn unify(types: impl IntoIterator<Item = Option<ColumnType>>) -> Option<ColumnType> {
    let mut known = types.into_iter().flatten();
    let first = known.next()?;
    if known.all(|t| t == first) {
        Some(first)
    } else {
        Some(ColumnType::String)
    }
}

/// The type of a literal, from how it is written.
#[must_use]
pub fn literal_type(literal: &Literal) -> Option<ColumnType> {
    match literal {
        Literal::Null => None,
        Literal::Boolean(_) => Some(ColumnType::Boolean),
        Literal::Number(text) if text.parse::<i64>().is_ok() => Some(ColumnType::Integer),
        Literal::Number(_) => Some(ColumnType::Double),
        Literal::String(_) => Some(ColumnType::String),
    }
}

/// Infers expression types against the tables of one query specification.
pub struct TypeInference<'a> {
    mapper: &'a TableAndColumnMapper,
    provider: &'a dyn SchemaProvider,
}

impl<'a> TypeInference<'a> {
    /// Creates an inference over the tables bound by `mapper`.
    #[must_use]
    pub fn new(mapper: &'a TableAndColumnMapper, provider: &'a dyn SchemaProvider) -> Self {
        Self { mapper, provider }
    }

    /// The type a `CAST` produces.
    #[must_use]
    pub fn cast_type(&self, target: &CastTarget) -> Option<ColumnType> {
        match target {
            CastTarget::Type(t) => Some(*t),
            CastTarget::ColumnId(id) => self.provider.get_column_model(*id).map(|m| m.column_type()),
            CastTarget::Physical(name) => match name.as_str() {
                "CHAR" => Some(ColumnType::String),
                "SIGNED" => Some(ColumnType::Integer),
                "DOUBLE" => Some(ColumnType::Double),
                "UNSIGNED" => Some(ColumnType::Boolean),
                "JSON" => Some(ColumnType::Json),
                _ => None,
            },
        }
    }

    /// Infers the type of `expr`.
    #[must_use]
    pub fn infer(&self, expr: &Expr) -> Option<ColumnType> {
        match expr {
            Expr::Literal(literal) => literal_type(literal),
            Expr::Column(column) => {
                self.mapper.resolve(column).ok().flatten().map(|r| r.column_type())
            }
            Expr::Parameter(_) | Expr::Wildcard => None,
            Expr::CurrentUser => Some(ColumnType::Integer),
            Expr::Function(func) => {
                let name = func.name.as_str();
                if listed(STRING_FUNCTIONS, name) {
                    Some(ColumnType::String)
                } else if listed(INTEGER_FUNCTIONS, name) {
                    Some(ColumnType::Integer)
                } else if name == "AVG" {
                    Some(ColumnType::Double)
                } else if listed(DATE_FUNCTIONS, name) {
                    Some(ColumnType::Date)
                } else if listed(JSON_FUNCTIONS, name) {
                    Some(ColumnType::Json)
                } else if listed(BOOLEAN_FUNCTIONS, name) {
                    Some(ColumnType::Boolean)
                } else if listed(PRESERVING_FUNCTIONS, name) {
                    func.args.first().and_then(|a| self.infer(a))
                } else if listed(UNIFYING_FUNCTIONS, name) {
                    unify(func.args.iter().map(|a| self.infer(a)))
                } else {
                    None
                }
            }
            Expr::Cast { target, .. } => self.cast_type(target),
            Expr::Case(case) => {
                let branches = case
                    .when_clauses
                    .iter()
                    .map(|(_, then)| then)
                    .chain(case.else_result.as_deref());
                unify(branches.map(|b| self.infer(b)))
            }
            Expr::BinaryOp { left, op, right } if op.is_arithmetic() => {
                match (self.infer(left), self.infer(right)) {
                    (Some(l), Some(r)) if l == r => Some(l),
                    (Some(ColumnType::Double), _) | (_, Some(ColumnType::Double)) => Some(ColumnType::Double),
                    (l, r) => l.or(r),
                }
            }
            Expr::BinaryOp { .. } | Expr::UnaryOp { op: UnaryOp::Not, .. } => Some(ColumnType::Boolean),
            Expr::UnaryOp { operand, .. } | Expr::Nested(operand) => self.infer(operand),
            Expr::IsNull { .. }
            | Expr::IsBoolean { .. }
            | Expr::Between { .. }
            | Expr::InList { .. }
            | Expr::InSubquery { .. }
            | Expr::Like { .. }
            | Expr::Has { .. }
            | Expr::BooleanFunction { .. }
            | Expr::TextMatches(_)
            | Expr::MatchAgainst(_) => Some(ColumnType::Boolean),
            Expr::Unnest(column) => {
                self.mapper.resolve(column).ok().flatten().map(|r| r.column_type().non_list_type())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_expression, parse_query};
    use crate::schema::InMemorySchemaProvider;
    use tablequery_core::{ColumnId, ColumnModel, IdAndVersion};

    fn provider() -> InMemorySchemaProvider {
        InMemorySchemaProvider::new()
            .with_table(
                IdAndVersion::new(123),
                vec![
                    ColumnModel::new(ColumnId::new(111), "foo", ColumnType::String),
                    ColumnModel::new(ColumnId::new(222), "bar", ColumnType::String),
                    ColumnModel::new(ColumnId::new(333), "inttype", ColumnType::Integer),
                    ColumnModel::new(ColumnId::new(777), "doubletype", ColumnType::Double),
                    ColumnModel::new(ColumnId::new(888), "tags", ColumnType::StringList),
                ],
            )
            .with_column(ColumnModel::new(ColumnId::new(999), "other", ColumnType::Date))
    }

    fn infer(expr: &str) -> Option<ColumnType> {
        let provider = provider();
        let query = parse_query("select * from syn123").unwrap();
        let mapper = TableAndColumnMapper::new(&query.body, &provider).unwrap();
        TypeInference::new(&mapper, &provider).infer(&parse_expression(expr).unwrap())
    }

    #[test]
    fn literals() {
        assert_eq!(infer("1"), Some(ColumnType::Integer));
        assert_eq!(infer("1.5"), Some(ColumnType::Double));
        assert_eq!(infer("'a'"), Some(ColumnType::String));
        assert_eq!(infer("true"), Some(ColumnType::Boolean));
        assert_eq!(infer("null"), None);
    }

    #[test]
    fn columns() {
        assert_eq!(infer("inttype"), Some(ColumnType::Integer));
        assert_eq!(infer("row_id"), Some(ColumnType::Integer));
        assert_eq!(infer("nope"), None);
        assert_eq!(infer("unnest(tags)"), Some(ColumnType::String));
    }

    #[test]
    fn set_functions() {
        assert_eq!(infer("count(*)"), Some(ColumnType::Integer));
        assert_eq!(infer("avg(inttype)"), Some(ColumnType::Double));
        assert_eq!(infer("sum(doubletype)"), Some(ColumnType::Double));
        assert_eq!(infer("min(foo)"), Some(ColumnType::String));
        assert_eq!(infer("group_concat(inttype)"), Some(ColumnType::String));
    }

    #[test]
    fn json_functions() {
        assert_eq!(infer("json_object('a', foo)"), Some(ColumnType::Json));
        assert_eq!(infer("json_array(foo)"), Some(ColumnType::Json));
        assert_eq!(infer("json_arrayagg(foo)"), Some(ColumnType::Json));
        assert_eq!(infer("json_extract(foo, '$.a')"), Some(ColumnType::String));
        assert_eq!(infer("json_overlaps(foo, '[1]')"), Some(ColumnType::Boolean));
    }

    #[test]
    fn casts() {
        assert_eq!(infer("cast(foo as integer)"), Some(ColumnType::Integer));
        assert_eq!(infer("cast(foo as 999)"), Some(ColumnType::Date));
        assert_eq!(infer("cast(foo as 1234)"), None);
    }

    #[test]
    fn unification() {
        assert_eq!(infer("nullif(foo, bar)"), Some(ColumnType::String));
        assert_eq!(infer("nullif(inttype, 1)"), Some(ColumnType::Integer));
        assert_eq!(infer("case when foo = 'a' then 1 else 2 end"), Some(ColumnType::Integer));
        assert_eq!(infer("case when foo = 'a' then 1 else 'x' end"), Some(ColumnType::String));
        assert_eq!(infer("case when foo = 'a' then 1.5 else null end"), Some(ColumnType::Double));
    }

    #[test]
    fn arithmetic_and_predicates() {
        assert_eq!(infer("inttype + 1"), Some(ColumnType::Integer));
        assert_eq!(infer("inttype * 1.5"), Some(ColumnType::Double));
        assert_eq!(infer("foo = 'a'"), Some(ColumnType::Boolean));
        assert_eq!(infer("foo is null"), Some(ColumnType::Boolean));
        assert_eq!(infer("(inttype)"), Some(ColumnType::Integer));
    }
}
