//! Error types for query parsing and translation.

use std::fmt;

use tablequery_core::CoreError;
use thiserror::Error;

/// Errors that can occur during query parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An error from the underlying tokenizer.
    #[error("SQL syntax error: {0}")]
    SqlSyntax(String),

    /// Empty query string.
    #[error("empty query")]
    EmptyQuery,

    /// Unexpected token during parsing.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was actually found.
        found: String,
    },

    /// The input ended while more was expected.
    #[error("unexpected end of query: expected {0}")]
    UnexpectedEnd(String),

    /// Invalid literal value.
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    /// A table name is not a table identifier.
    #[error("invalid table name: {0}")]
    InvalidTableName(String),
}

impl From<sqlparser::tokenizer::TokenizerError> for ParseError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        Self::SqlSyntax(err.to_string())
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Constructs that are rejected with a fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedConstruct {
    /// `UNION` outside of a build context.
    Union,
    /// `JOIN` outside of a build context.
    Join,
    /// A `WITH` clause with other than one element.
    MultipleCteElements,
    /// An outer `DEFINING_WHERE` on a grouped defining query.
    DefiningWhereWithGroupBy,
    /// A grouped defining query whose dependencies carry a benefactor.
    DefiningSqlWithGroupBy,
    /// `DEFINING_WHERE` against something other than a virtual table.
    DefiningWhere,
}

impl UnsupportedConstruct {
    /// The fixed message reported for this construct.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Union => "The UNION keyword is not supported in this context",
            Self::Join => "The JOIN keyword is not supported in this context",
            Self::MultipleCteElements => "A CTE must have one and only one inner query.",
            Self::DefiningWhereWithGroupBy => {
                "The DEFINING_WHERE cannot be used with a defining SQL that includes a GROUP BY"
            }
            Self::DefiningSqlWithGroupBy => {
                "The defining SQL cannot include a GROUP BY or aggregation when it depends on a view"
            }
            Self::DefiningWhere => "The DEFINING_WHERE is only supported for virtual tables",
        }
    }
}

impl fmt::Display for UnsupportedConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Classification of translation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required input is missing or inconsistent.
    Configuration,
    /// A column, table, facet or JSON path could not be resolved.
    UnresolvedIdentifier,
    /// A construct is not allowed in this context.
    Unsupported,
    /// The query text does not parse.
    Malformed,
}

/// Errors that can occur while translating a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A required input was not supplied.
    #[error("{0} is required.")]
    MissingInput(&'static str),

    /// The configuration is inconsistent.
    #[error("{0}")]
    Configuration(String),

    /// A column reference did not match any column.
    #[error("Column does not exist: {0}")]
    ColumnDoesNotExist(String),

    /// An unqualified column name matches more than one table.
    #[error("Column name is ambiguous: {0}")]
    AmbiguousColumn(String),

    /// A table referenced by the query has no schema.
    #[error("Schema for {0} does not exist")]
    UnknownTable(String),

    /// A facet or filter names a column or path that does not exist.
    #[error("{0}")]
    UnresolvedFacet(String),

    /// A construct is rejected in this context.
    #[error("{0}")]
    Unsupported(UnsupportedConstruct),

    /// An operation does not apply to the resolved column.
    #[error("{0}")]
    InvalidOperand(String),

    /// The input does not parse.
    #[error(transparent)]
    Malformed(#[from] ParseError),

    /// A core type could not be built.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TranslateError {
    /// The classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput(_) | Self::Configuration(_) | Self::Core(_) => {
                ErrorKind::Configuration
            }
            Self::ColumnDoesNotExist(_)
            | Self::AmbiguousColumn(_)
            | Self::UnknownTable(_)
            | Self::UnresolvedFacet(_)
            | Self::InvalidOperand(_) => ErrorKind::UnresolvedIdentifier,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Malformed(_) => ErrorKind::Malformed,
        }
    }
}

impl From<UnsupportedConstruct> for TranslateError {
    fn from(construct: UnsupportedConstruct) -> Self {
        Self::Unsupported(construct)
    }
}

/// Result type for translation operations.
pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParseError::SqlSyntax("unterminated string".to_string());
        assert!(err.to_string().contains("SQL syntax error"));
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn unexpected_token_display() {
        let err = ParseError::UnexpectedToken {
            expected: "identifier".to_string(),
            found: "number".to_string(),
        };
        assert!(err.to_string().contains("expected identifier"));
        assert!(err.to_string().contains("found number"));
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(
            TranslateError::from(UnsupportedConstruct::Union).to_string(),
            "The UNION keyword is not supported in this context"
        );
        assert_eq!(
            TranslateError::from(UnsupportedConstruct::Join).to_string(),
            "The JOIN keyword is not supported in this context"
        );
        assert_eq!(
            TranslateError::ColumnDoesNotExist("a.inttypeWrong".to_string()).to_string(),
            "Column does not exist: a.inttypeWrong"
        );
        assert_eq!(TranslateError::MissingInput("schemaProvider").to_string(), "schemaProvider is required.");
    }

    #[test]
    fn kinds() {
        assert_eq!(TranslateError::MissingInput("x").kind(), ErrorKind::Configuration);
        assert_eq!(
            TranslateError::ColumnDoesNotExist("x".to_string()).kind(),
            ErrorKind::UnresolvedIdentifier
        );
        assert_eq!(TranslateError::from(UnsupportedConstruct::Join).kind(), ErrorKind::Unsupported);
        assert_eq!(TranslateError::from(ParseError::EmptyQuery).kind(), ErrorKind::Malformed);
    }
}
