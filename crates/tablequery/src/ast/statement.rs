//! Statement AST types.
//!
//! A query is a [`QueryExpression`]: an optional `WITH` clause, a first
//! [`QuerySpecification`] and any number of `UNION` branches.

use std::fmt;

use super::expr::{Expr, Identifier};

/// A full query, possibly with a CTE and UNION branches.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryExpression {
    /// Common Table Expressions (WITH clause).
    pub with_clause: Option<WithClause>,
    /// The first query specification.
    pub body: QuerySpecification,
    /// Specifications combined with UNION, in order.
    pub unions: Vec<UnionBranch>,
}

impl QueryExpression {
    /// Creates a query consisting of a single specification.
    #[must_use]
    pub const fn new(body: QuerySpecification) -> Self {
        Self { with_clause: None, body, unions: Vec::new() }
    }

    /// Adds a WITH clause.
    #[must_use]
    pub fn with_cte(mut self, with_clause: WithClause) -> Self {
        self.with_clause = Some(with_clause);
        self
    }

    /// Adds a UNION branch.
    #[must_use]
    pub fn union(mut self, all: bool, query: QuerySpecification) -> Self {
        self.unions.push(UnionBranch { all, query });
        self
    }

    /// The specifications of this query, first to last, excluding any CTE.
    pub fn specifications(&self) -> impl Iterator<Item = &QuerySpecification> {
        std::iter::once(&self.body).chain(self.unions.iter().map(|u| &u.query))
    }

    /// Mutable access to the specifications, first to last.
    pub fn specifications_mut(&mut self) -> impl Iterator<Item = &mut QuerySpecification> {
        std::iter::once(&mut self.body).chain(self.unions.iter_mut().map(|u| &mut u.query))
    }

    /// Returns `true` if this query has UNION branches.
    #[must_use]
    pub fn is_union(&self) -> bool {
        !self.unions.is_empty()
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(with) = &self.with_clause {
            write!(f, "{with} ")?;
        }
        write!(f, "{}", self.body)?;
        for branch in &self.unions {
            write!(f, " UNION ")?;
            if branch.all {
                write!(f, "ALL ")?;
            }
            write!(f, "{}", branch.query)?;
        }
        Ok(())
    }
}

/// One `UNION [ALL]` branch.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionBranch {
    /// Whether ALL is specified.
    pub all: bool,
    /// The branch query.
    pub query: QuerySpecification,
}

/// A WITH clause.
#[derive(Debug, Clone, PartialEq)]
pub struct WithClause {
    /// The named subqueries.
    pub elements: Vec<WithElement>,
}

impl fmt::Display for WithClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WITH ")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

/// A Common Table Expression (CTE) defined in a WITH clause.
#[derive(Debug, Clone, PartialEq)]
pub struct WithElement {
    /// The name of the CTE.
    pub name: Identifier,
    /// Optional column names for the CTE.
    pub columns: Vec<Identifier>,
    /// The subquery that defines the CTE.
    pub query: Box<QueryExpression>,
}

impl WithElement {
    /// Creates a CTE without column names.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, query: QueryExpression) -> Self {
        Self { name: name.into(), columns: vec![], query: Box::new(query) }
    }
}

impl fmt::Display for WithElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.columns.is_empty() {
            write!(f, " (")?;
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{column}")?;
            }
            write!(f, ")")?;
        }
        write!(f, " AS ({})", self.query)
    }
}

/// A single SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpecification {
    /// Whether DISTINCT is specified.
    pub distinct: bool,
    /// The projection (SELECT list).
    pub select_list: SelectList,
    /// The FROM clause.
    pub from: TableRef,
    /// Filter applied inside a virtual table's defining query.
    pub defining_where: Option<Expr>,
    /// Optional WHERE clause.
    pub where_clause: Option<Expr>,
    /// Optional GROUP BY clause.
    pub group_by: Vec<Expr>,
    /// Optional ORDER BY clause.
    pub order_by: Vec<OrderByExpr>,
    /// Optional LIMIT/OFFSET.
    pub pagination: Option<Pagination>,
}

impl QuerySpecification {
    /// Creates a new SELECT with the given projection and source.
    #[must_use]
    pub const fn new(select_list: SelectList, from: TableRef) -> Self {
        Self {
            distinct: false,
            select_list,
            from,
            defining_where: None,
            where_clause: None,
            group_by: vec![],
            order_by: vec![],
            pagination: None,
        }
    }

    /// Sets the WHERE clause.
    #[must_use]
    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.where_clause = Some(condition);
        self
    }

    /// Sets the LIMIT and OFFSET.
    #[must_use]
    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Returns `true` if rows of this query do not map one-to-one to table
    /// rows: DISTINCT, GROUP BY, or an aggregate in the select list.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        self.distinct || !self.group_by.is_empty() || self.select_list.contains_set_function()
    }

    /// Returns `true` if every select item is an aggregate call.
    #[must_use]
    pub fn is_only_set_functions(&self) -> bool {
        match &self.select_list {
            SelectList::Star => false,
            SelectList::Items(items) => items.iter().all(|i| i.expr.is_set_function()),
        }
    }
}

impl fmt::Display for QuerySpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        write!(f, "{} FROM {}", self.select_list, self.from)?;
        if let Some(defining_where) = &self.defining_where {
            write!(f, " DEFINING_WHERE {defining_where}")?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ")?;
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{expr}")?;
            }
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{order}")?;
            }
        }
        if let Some(pagination) = &self.pagination {
            write!(f, " {pagination}")?;
        }
        Ok(())
    }
}

/// The projection of a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    /// `*`.
    Star,
    /// Explicit items.
    Items(Vec<SelectItem>),
}

impl SelectList {
    /// Returns `true` if any item contains an aggregate call.
    #[must_use]
    pub fn contains_set_function(&self) -> bool {
        match self {
            Self::Star => false,
            Self::Items(items) => items.iter().any(|i| i.expr.contains_set_function()),
        }
    }
}

impl fmt::Display for SelectList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Star => write!(f, "*"),
            Self::Items(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// An expression in the select list, optionally aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// The expression.
    pub expr: Expr,
    /// Optional alias.
    pub alias: Option<Identifier>,
}

impl SelectItem {
    /// Creates an unaliased expression item.
    #[must_use]
    pub const fn expr(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    /// Creates an aliased expression item.
    #[must_use]
    pub fn aliased(expr: Expr, alias: impl Into<Identifier>) -> Self {
        Self { expr, alias: Some(alias.into()) }
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        Self::expr(expr)
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {alias}")?;
        }
        Ok(())
    }
}

/// A table named in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    /// The name as written (`syn123`, `syn123.4`, or a physical name).
    pub name: String,
    /// Optional alias.
    pub alias: Option<Identifier>,
}

impl TableName {
    /// Creates an unaliased table name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), alias: None }
    }

    /// Creates an aliased table name.
    #[must_use]
    pub fn aliased(name: impl Into<String>, alias: impl Into<Identifier>) -> Self {
        Self { name: name.into(), alias: Some(alias.into()) }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " {alias}")?;
        }
        Ok(())
    }
}

/// A table reference in a FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A simple table reference.
    Table(TableName),
    /// A join between two table references.
    Join(Box<JoinClause>),
}

impl TableRef {
    /// Creates a simple table reference.
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table(TableName::new(name))
    }

    /// The tables referenced, left to right.
    #[must_use]
    pub fn tables(&self) -> Vec<&TableName> {
        match self {
            Self::Table(table) => vec![table],
            Self::Join(join) => {
                let mut tables = join.left.tables();
                tables.push(&join.right);
                tables
            }
        }
    }

    /// Mutable access to the tables referenced, left to right.
    pub fn tables_mut(&mut self) -> Vec<&mut TableName> {
        match self {
            Self::Table(table) => vec![table],
            Self::Join(join) => {
                let JoinClause { left, right, .. } = join.as_mut();
                let mut tables = left.tables_mut();
                tables.push(right);
                tables
            }
        }
    }

    /// Returns `true` if this reference contains a join.
    #[must_use]
    pub const fn is_join(&self) -> bool {
        matches!(self, Self::Join(_))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(table) => write!(f, "{table}"),
            Self::Join(join) => {
                write!(f, "{} {} {} ON {}", join.left, join.join_type, join.right, join.condition)
            }
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Left side of the join.
    pub left: TableRef,
    /// Right side of the join.
    pub right: TableName,
    /// Join type.
    pub join_type: JoinType,
    /// The ON condition.
    pub condition: Expr,
}

impl JoinClause {
    /// Creates a join of the given type.
    #[must_use]
    pub const fn new(left: TableRef, join_type: JoinType, right: TableName, on: Expr) -> Self {
        Self { left, right, join_type, condition: on }
    }
}

/// Type of JOIN, as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// `JOIN`.
    Join,
    /// `INNER JOIN`.
    Inner,
    /// `LEFT JOIN`.
    Left,
    /// `LEFT OUTER JOIN`.
    LeftOuter,
    /// `RIGHT JOIN`.
    Right,
    /// `RIGHT OUTER JOIN`.
    RightOuter,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::Join => "JOIN",
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::Right => "RIGHT JOIN",
            Self::RightOuter => "RIGHT OUTER JOIN",
        };
        write!(f, "{keyword}")
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ordering {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

/// An ORDER BY key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    /// The sort key.
    pub expr: Expr,
    /// The direction, if written.
    pub ordering: Option<Ordering>,
}

impl OrderByExpr {
    /// Creates a sort key without an explicit direction.
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self { expr, ordering: None }
    }

    /// Creates a sort key with an explicit direction.
    #[must_use]
    pub const fn with_ordering(expr: Expr, ordering: Ordering) -> Self {
        Self { expr, ordering: Some(ordering) }
    }
}

impl fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(ordering) = self.ordering {
            write!(f, " {ordering}")?;
        }
        Ok(())
    }
}

/// LIMIT and OFFSET.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    /// The LIMIT value.
    pub limit: Expr,
    /// The OFFSET value.
    pub offset: Option<Expr>,
}

impl Pagination {
    /// Creates a pagination from numeric values.
    #[must_use]
    pub fn new(limit: u64, offset: Option<u64>) -> Self {
        Self { limit: Expr::number(limit), offset: offset.map(Expr::number) }
    }
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LIMIT {}", self.limit)?;
        if let Some(offset) = &self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::ColumnReference;

    fn select(items: Vec<SelectItem>, table: &str) -> QuerySpecification {
        QuerySpecification::new(SelectList::Items(items), TableRef::table(table))
    }

    #[test]
    fn simple_select_display() {
        let query = select(vec![Expr::column("foo").into()], "syn123")
            .where_clause(Expr::column("foo").eq(Expr::number(1)))
            .pagination(Pagination::new(10, Some(5)));
        assert_eq!(query.to_string(), "SELECT foo FROM syn123 WHERE foo = 1 LIMIT 10 OFFSET 5");
    }

    #[test]
    fn join_display() {
        let condition = Expr::Column(ColumnReference::qualified("a", "foo"))
            .eq(Expr::Column(ColumnReference::qualified("b", "foo")))
            .nested();
        let join = JoinClause::new(
            TableRef::Table(TableName::aliased("syn1", "a")),
            JoinType::LeftOuter,
            TableName::aliased("syn2", "b"),
            condition,
        );
        let from = TableRef::Join(Box::new(join));
        assert_eq!(from.to_string(), "syn1 a LEFT OUTER JOIN syn2 b ON ( a.foo = b.foo )");
        assert_eq!(from.tables().len(), 2);
    }

    #[test]
    fn cte_and_union_display() {
        let inner = QueryExpression::new(select(vec![Expr::column("_C1_").into()], "T1"));
        let mut element = WithElement::new("T2", inner);
        element.columns = vec![Identifier::new("_C1_")];
        let query = QueryExpression::new(select(vec![Expr::column("_C1_").into()], "T2"))
            .with_cte(WithClause { elements: vec![element] })
            .union(true, select(vec![Expr::column("_C1_").into()], "T3"));
        assert_eq!(
            query.to_string(),
            "WITH T2 (_C1_) AS (SELECT _C1_ FROM T1) SELECT _C1_ FROM T2 UNION ALL SELECT _C1_ FROM T3"
        );
        assert_eq!(query.specifications().count(), 2);
    }

    #[test]
    fn aggregate_detection() {
        let plain = select(vec![Expr::column("foo").into()], "syn1");
        assert!(!plain.is_aggregate());

        let counted = select(vec![Expr::function("count", vec![Expr::Wildcard]).into()], "syn1");
        assert!(counted.is_aggregate());
        assert!(counted.is_only_set_functions());

        let mut distinct = select(vec![Expr::column("foo").into()], "syn1");
        distinct.distinct = true;
        assert!(distinct.is_aggregate());
    }
}
