//! Expression AST types.
//!
//! This module defines the expression types that form select items,
//! predicates and sort keys. The `Display` implementations produce the
//! canonical text of an expression, which is also the physical SQL once the
//! translator has rewritten the names.

use std::fmt;
use std::ops::Not;

use tablequery_core::{ColumnId, ColumnType};

use super::statement::QueryExpression;

/// Names of the functions that aggregate over rows.
const SET_FUNCTIONS: [&str; 7] =
    ["COUNT", "SUM", "AVG", "MIN", "MAX", "GROUP_CONCAT", "JSON_ARRAYAGG"];

/// Returns `true` if `name` is an aggregate (set) function.
#[must_use]
pub fn is_set_function_name(name: &str) -> bool {
    SET_FUNCTIONS.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// A literal value in a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// A numeric literal, kept as written.
    Number(String),
    /// UTF-8 string.
    String(String),
}

impl Literal {
    /// The text of the literal without quotes.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => n.clone(),
            Self::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(true) => write!(f, "TRUE"),
            Self::Boolean(false) => write!(f, "FALSE"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// An identifier (column name, alias, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The name of the identifier, with any quoting removed.
    pub name: String,
    /// Optional quote character used (`"` or `` ` ``).
    pub quote_style: Option<char>,
}

impl Identifier {
    /// Creates a new unquoted identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), quote_style: None }
    }

    /// Creates a new quoted identifier.
    #[must_use]
    pub fn quoted(name: impl Into<String>, quote: char) -> Self {
        Self { name: name.into(), quote_style: Some(quote) }
    }

    /// Creates a back-quoted identifier.
    #[must_use]
    pub fn backtick(name: impl Into<String>) -> Self {
        Self::quoted(name, '`')
    }

    /// Returns `true` if the identifier was written with quotes.
    #[must_use]
    pub const fn is_delimited(&self) -> bool {
        self.quote_style.is_some()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote_style {
            Some(q) => {
                let escaped = self.name.replace(q, &format!("{q}{q}"));
                write!(f, "{q}{escaped}{q}")
            }
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A possibly qualified column reference (e.g., `a.foo`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    /// The table name or alias qualifying the column.
    pub qualifier: Option<Identifier>,
    /// The column name.
    pub name: Identifier,
}

impl ColumnReference {
    /// Creates an unqualified reference.
    #[must_use]
    pub fn simple(name: impl Into<Identifier>) -> Self {
        Self { qualifier: None, name: name.into() }
    }

    /// Creates a reference qualified by a table name or alias.
    #[must_use]
    pub fn qualified(qualifier: impl Into<Identifier>, name: impl Into<Identifier>) -> Self {
        Self { qualifier: Some(qualifier.into()), name: name.into() }
    }

    /// The reference as the user wrote it, without quotes.
    #[must_use]
    pub fn unquoted_text(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}", q.name, self.name.name),
            None => self.name.name.clone(),
        }
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(q) = &self.qualifier {
            write!(f, "{q}.")?;
        }
        write!(f, "{}", self.name)
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition (+).
    Add,
    /// Subtraction (-).
    Sub,
    /// Multiplication (*).
    Mul,
    /// Division (/).
    Div,
    /// Modulo (%).
    Mod,
    /// Integer division (DIV).
    IntDiv,
    /// Modulo keyword (MOD).
    ModKeyword,

    // Comparison
    /// Equal (=).
    Eq,
    /// Not equal (<> or !=).
    NotEq,
    /// Less than (<).
    Lt,
    /// Less than or equal (<=).
    LtEq,
    /// Greater than (>).
    Gt,
    /// Greater than or equal (>=).
    GtEq,

    // Logical
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

impl BinaryOp {
    /// Returns `true` for operators rendered without surrounding spaces.
    #[must_use]
    pub const fn is_symbolic_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod)
    }

    /// Returns `true` for arithmetic operators.
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        self.is_symbolic_arithmetic() || matches!(self, Self::IntDiv | Self::ModKeyword)
    }

    /// Returns `true` for comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::IntDiv => "DIV",
            Self::ModKeyword => "MOD",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        };
        write!(f, "{op}")
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Numeric negation (-).
    Neg,
    /// Unary plus (+).
    Plus,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Not => "NOT ",
            Self::Neg => "-",
            Self::Plus => "+",
        };
        write!(f, "{op}")
    }
}

/// Predicates over the special values of a DOUBLE column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanFunction {
    /// `isNaN(col)`.
    IsNaN,
    /// `isInfinity(col)`.
    IsInfinity,
}

impl fmt::Display for BooleanFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IsNaN => write!(f, "isNaN"),
            Self::IsInfinity => write!(f, "isInfinity"),
        }
    }
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The function name, upper-cased.
    pub name: String,
    /// The function arguments.
    pub args: Vec<Expr>,
    /// Whether DISTINCT was specified (for aggregates).
    pub distinct: bool,
}

impl FunctionCall {
    /// Creates a new function call with the given name and arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self { name: name.into().to_ascii_uppercase(), args, distinct: false }
    }

    /// Returns `true` if this call aggregates over rows.
    #[must_use]
    pub fn is_set_function(&self) -> bool {
        is_set_function_name(&self.name)
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        let separator = if self.is_set_function() { ", " } else { "," };
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, "{separator}")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// The target of a `CAST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastTarget {
    /// A logical column type (`CAST(x AS INTEGER)`).
    Type(ColumnType),
    /// The id of a column whose type is used (`CAST(x AS 777)`).
    ColumnId(ColumnId),
    /// A type of the physical store (`CAST(x AS SIGNED)`).
    Physical(String),
}

impl fmt::Display for CastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(t) => write!(f, "{t}"),
            Self::ColumnId(id) => write!(f, "{id}"),
            Self::Physical(name) => write!(f, "{name}"),
        }
    }
}

/// A CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    /// The operand (for simple CASE).
    pub operand: Option<Box<Expr>>,
    /// WHEN...THEN branches.
    pub when_clauses: Vec<(Expr, Expr)>,
    /// ELSE expression.
    pub else_result: Option<Box<Expr>>,
}

impl fmt::Display for CaseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CASE")?;
        if let Some(operand) = &self.operand {
            write!(f, " {operand}")?;
        }
        for (when, then) in &self.when_clauses {
            write!(f, " WHEN {when} THEN {then}")?;
        }
        if let Some(else_result) = &self.else_result {
            write!(f, " ELSE {else_result}")?;
        }
        write!(f, " END")
    }
}

/// An expression in a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),

    /// A column reference.
    Column(ColumnReference),

    /// A bind placeholder (`:name`).
    Parameter(String),

    /// `CURRENT_USER()`.
    CurrentUser,

    /// `*` as a function argument (`COUNT(*)`).
    Wildcard,

    /// A function call.
    Function(FunctionCall),

    /// `CAST(expr AS target)`.
    Cast {
        /// The expression to convert.
        expr: Box<Expr>,
        /// The target type.
        target: CastTarget,
    },

    /// A CASE expression.
    Case(CaseExpr),

    /// A binary operation.
    BinaryOp {
        /// Left operand.
        left: Box<Expr>,
        /// The operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary operation.
    UnaryOp {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },

    /// A parenthesized expression.
    Nested(Box<Expr>),

    /// `expr IS [NOT] NULL`.
    IsNull {
        /// The tested expression.
        expr: Box<Expr>,
        /// Whether NOT was specified.
        negated: bool,
    },

    /// `expr IS [NOT] TRUE|FALSE`.
    IsBoolean {
        /// The tested expression.
        expr: Box<Expr>,
        /// The truth value tested for.
        value: bool,
        /// Whether NOT was specified.
        negated: bool,
    },

    /// `expr [NOT] BETWEEN low AND high`.
    Between {
        /// The tested expression.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether NOT was specified.
        negated: bool,
    },

    /// `expr [NOT] IN ( a, b )`.
    InList {
        /// The tested expression.
        expr: Box<Expr>,
        /// The candidate values.
        list: Vec<Expr>,
        /// Whether NOT was specified.
        negated: bool,
    },

    /// `expr [NOT] IN ( SELECT ... )`.
    InSubquery {
        /// The tested expression.
        expr: Box<Expr>,
        /// The subquery producing the candidates.
        subquery: Box<QueryExpression>,
        /// Whether NOT was specified.
        negated: bool,
    },

    /// `expr [NOT] LIKE pattern [ESCAPE escape]`.
    Like {
        /// The tested expression.
        expr: Box<Expr>,
        /// The pattern.
        pattern: Box<Expr>,
        /// Optional escape character.
        escape: Option<Box<Expr>>,
        /// Whether NOT was specified.
        negated: bool,
    },

    /// `list_column [NOT] HAS|HAS_LIKE ( a, b )`.
    Has {
        /// The list column.
        expr: Box<Expr>,
        /// The values any element must match.
        list: Vec<Expr>,
        /// `HAS_LIKE` when true.
        like: bool,
        /// Whether NOT was specified.
        negated: bool,
    },

    /// `isNaN(col)` or `isInfinity(col)`.
    BooleanFunction {
        /// The function.
        function: BooleanFunction,
        /// The DOUBLE column tested.
        column: ColumnReference,
    },

    /// `TEXT_MATCHES('text')`.
    TextMatches(Box<Expr>),

    /// `MATCH(ROW_SEARCH_CONTENT) AGAINST(value)`.
    MatchAgainst(Box<Expr>),

    /// `UNNEST(list_column)`.
    Unnest(ColumnReference),
}

impl Expr {
    /// Creates a literal null expression.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    /// Creates a numeric literal expression.
    #[must_use]
    pub fn number(value: impl fmt::Display) -> Self {
        Self::Literal(Literal::Number(value.to_string()))
    }

    /// Creates a literal string expression.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    /// Creates an unqualified column reference expression.
    #[must_use]
    pub fn column(name: impl Into<Identifier>) -> Self {
        Self::Column(ColumnReference::simple(name))
    }

    /// Creates a binary operation expression.
    #[must_use]
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::BinaryOp { left: Box::new(left), op, right: Box::new(right) }
    }

    /// Creates a unary operation expression.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::UnaryOp { op, operand: Box::new(operand) }
    }

    /// Creates a function call expression.
    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function(FunctionCall::new(name, args))
    }

    /// Wraps the expression in parentheses.
    #[must_use]
    pub fn nested(self) -> Self {
        Self::Nested(Box::new(self))
    }

    /// Wraps the expression in parentheses unless it already is.
    #[must_use]
    pub fn parenthesized(self) -> Self {
        match self {
            Self::Nested(_) => self,
            other => other.nested(),
        }
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Creates a NOT expression.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Eq, other)
    }

    /// Creates an `IS [NOT] NULL` expression.
    #[must_use]
    pub fn is_null(self, negated: bool) -> Self {
        Self::IsNull { expr: Box::new(self), negated }
    }

    /// Returns `true` if this is a call to an aggregate function.
    #[must_use]
    pub fn is_set_function(&self) -> bool {
        matches!(self, Self::Function(f) if f.is_set_function())
    }

    /// Returns `true` if this expression or any sub-expression aggregates.
    ///
    /// Subqueries are not searched.
    #[must_use]
    pub fn contains_set_function(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| found |= e.is_set_function());
        found
    }

    /// Returns `true` for literals and `CURRENT_USER()`.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Literal(_) | Self::CurrentUser)
    }

    /// Visits this expression and every sub-expression in pre-order.
    ///
    /// Subqueries are not entered.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        match self {
            Self::Literal(_)
            | Self::Column(_)
            | Self::Parameter(_)
            | Self::CurrentUser
            | Self::Wildcard
            | Self::BooleanFunction { .. }
            | Self::Unnest(_) => {}
            Self::Function(func) => func.args.iter().for_each(|a| a.walk(visit)),
            Self::Cast { expr, .. }
            | Self::UnaryOp { operand: expr, .. }
            | Self::Nested(expr)
            | Self::IsNull { expr, .. }
            | Self::IsBoolean { expr, .. }
            | Self::InSubquery { expr, .. }
            | Self::TextMatches(expr)
            | Self::MatchAgainst(expr) => expr.walk(visit),
            Self::Case(case) => {
                if let Some(operand) = &case.operand {
                    operand.walk(visit);
                }
                for (when, then) in &case.when_clauses {
                    when.walk(visit);
                    then.walk(visit);
                }
                if let Some(else_result) = &case.else_result {
                    else_result.walk(visit);
                }
            }
            Self::BinaryOp { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Self::Between { expr, low, high, .. } => {
                expr.walk(visit);
                low.walk(visit);
                high.walk(visit);
            }
            Self::InList { expr, list, .. } | Self::Has { expr, list, .. } => {
                expr.walk(visit);
                list.iter().for_each(|e| e.walk(visit));
            }
            Self::Like { expr, pattern, escape, .. } => {
                expr.walk(visit);
                pattern.walk(visit);
                if let Some(escape) = escape {
                    escape.walk(visit);
                }
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, list: &[Expr]) -> fmt::Result {
    write!(f, "( ")?;
    for (i, item) in list.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, " )")
}

const fn not_keyword(negated: bool) -> &'static str {
    if negated {
        "NOT "
    } else {
        ""
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Column(column) => write!(f, "{column}"),
            Self::Parameter(name) => write!(f, ":{name}"),
            Self::CurrentUser => write!(f, "CURRENT_USER()"),
            Self::Wildcard => write!(f, "*"),
            Self::Function(func) => write!(f, "{func}"),
            Self::Cast { expr, target } => write!(f, "CAST({expr} AS {target})"),
            Self::Case(case) => write!(f, "{case}"),
            Self::BinaryOp { left, op, right } => {
                if op.is_symbolic_arithmetic() {
                    write!(f, "{left}{op}{right}")
                } else {
                    write!(f, "{left} {op} {right}")
                }
            }
            Self::UnaryOp { op, operand } => write!(f, "{op}{operand}"),
            Self::Nested(expr) => write!(f, "( {expr} )"),
            Self::IsNull { expr, negated } => write!(f, "{expr} IS {}NULL", not_keyword(*negated)),
            Self::IsBoolean { expr, value, negated } => {
                let value = if *value { "TRUE" } else { "FALSE" };
                write!(f, "{expr} IS {}{value}", not_keyword(*negated))
            }
            Self::Between { expr, low, high, negated } => {
                write!(f, "{expr} {}BETWEEN {low} AND {high}", not_keyword(*negated))
            }
            Self::InList { expr, list, negated } => {
                write!(f, "{expr} {}IN ", not_keyword(*negated))?;
                write_list(f, list)
            }
            Self::InSubquery { expr, subquery, negated } => {
                write!(f, "{expr} {}IN ( {subquery} )", not_keyword(*negated))
            }
            Self::Like { expr, pattern, escape, negated } => {
                write!(f, "{expr} {}LIKE {pattern}", not_keyword(*negated))?;
                if let Some(escape) = escape {
                    write!(f, " ESCAPE {escape}")?;
                }
                Ok(())
            }
            Self::Has { expr, list, like, negated } => {
                let keyword = if *like { "HAS_LIKE" } else { "HAS" };
                write!(f, "{expr} {}{keyword} ", not_keyword(*negated))?;
                write_list(f, list)
            }
            Self::BooleanFunction { function, column } => write!(f, "{function}({column})"),
            Self::TextMatches(expr) => write!(f, "TEXT_MATCHES({expr})"),
            Self::MatchAgainst(expr) => write!(f, "MATCH(ROW_SEARCH_CONTENT) AGAINST({expr})"),
            Self::Unnest(column) => write!(f, "UNNEST({column})"),
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::number(value)
    }
}

impl From<ColumnReference> for Expr {
    fn from(column: ColumnReference) -> Self {
        Self::Column(column)
    }
}

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_display() {
        assert_eq!(Literal::Null.to_string(), "NULL");
        assert_eq!(Literal::Boolean(true).to_string(), "TRUE");
        assert_eq!(Literal::Number("1.0".to_string()).to_string(), "1.0");
        assert_eq!(Literal::String("it's".to_string()).to_string(), "'it''s'");
    }

    #[test]
    fn identifier_display() {
        assert_eq!(Identifier::new("foo").to_string(), "foo");
        assert_eq!(Identifier::quoted("has\"quote", '"').to_string(), "\"has\"\"quote\"");
        assert_eq!(Identifier::backtick("i` sum").to_string(), "`i`` sum`");
    }

    #[test]
    fn column_reference_text() {
        let column = ColumnReference::qualified("a", Identifier::quoted("has space", '"'));
        assert_eq!(column.to_string(), "a.\"has space\"");
        assert_eq!(column.unquoted_text(), "a.has space");
    }

    #[test]
    fn function_argument_separators() {
        let scalar = Expr::function("nullif", vec![Expr::column("a"), Expr::column("b")]);
        assert_eq!(scalar.to_string(), "NULLIF(a,b)");

        let mut count = FunctionCall::new("count", vec![Expr::column("a"), Expr::column("b")]);
        count.distinct = true;
        assert_eq!(Expr::Function(count).to_string(), "COUNT(DISTINCT a, b)");
    }

    #[test]
    fn operator_spacing() {
        let product = Expr::binary(Expr::column("a"), BinaryOp::Mul, Expr::number(1000));
        assert_eq!(product.to_string(), "a*1000");
        let div = Expr::binary(Expr::column("a"), BinaryOp::IntDiv, Expr::number(2));
        assert_eq!(div.to_string(), "a DIV 2");
        let cmp = Expr::column("a").eq(Expr::string("x"));
        assert_eq!(cmp.nested().negate().to_string(), "NOT ( a = 'x' )");
    }

    #[test]
    fn predicate_display() {
        let in_list = Expr::InList {
            expr: Box::new(Expr::column("a")),
            list: vec![Expr::number(1), Expr::number(2)],
            negated: true,
        };
        assert_eq!(in_list.to_string(), "a NOT IN ( 1, 2 )");

        let has = Expr::Has {
            expr: Box::new(Expr::column("tags")),
            list: vec![Expr::string("x")],
            like: true,
            negated: false,
        };
        assert_eq!(has.to_string(), "tags HAS_LIKE ( 'x' )");
    }

    #[test]
    fn set_function_detection() {
        let sum = Expr::function("sum", vec![Expr::column("a")]);
        let expr = Expr::binary(sum, BinaryOp::Add, Expr::number(1));
        assert!(!expr.is_set_function());
        assert!(expr.contains_set_function());
        assert!(!Expr::function("concat", vec![Expr::column("a")]).contains_set_function());
    }
}
