//! Query abstract syntax tree.
//!
//! This module defines the AST types for parsed queries:
//!
//! - [`statement`] - Query expressions, specifications, FROM, ORDER BY, etc.
//! - [`expr`] - Expressions (literals, operators, function calls, predicates)
//!
//! Every node implements `Display`, producing the canonical text of the
//! query. After translation the same rendering is the physical SQL.

pub mod expr;
pub mod statement;

// Re-export commonly used types at the module level
pub use expr::{
    is_set_function_name, BinaryOp, BooleanFunction, CaseExpr, CastTarget, ColumnReference, Expr,
    FunctionCall, Identifier, Literal, UnaryOp,
};
pub use statement::{
    JoinClause, JoinType, OrderByExpr, Ordering, Pagination, QueryExpression, QuerySpecification,
    SelectItem, SelectList, TableName, TableRef, UnionBranch, WithClause, WithElement,
};
