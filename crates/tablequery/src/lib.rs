//! Table Query
//!
//! This crate compiles queries written against logical tables (`syn123`) and
//! user-facing column names into SQL over the physical store (`T123`,
//! `_C111_`), with every literal bound as a named parameter.
//!
//! # Overview
//!
//! The compiler consists of several layers:
//!
//! - **AST**: Query expressions for the table query dialect
//! - **Parser**: Recursive-descent grammar over `sqlparser` tokens
//! - **Mapper**: Resolution of tables and column references to schema columns
//! - **Index descriptions**: How each kind of table is laid out and which
//!   metadata columns it carries
//! - **Translator**: Rewrites a query into physical SQL, derives its output
//!   schema and sizes its pages
//! - **Combined queries**: Merges facet selections, filters, sorting and
//!   paging into a user's query before translation
//!
//! # Modules
//!
//! - [`ast`] - Query abstract syntax tree types
//! - [`parser`] - Parser for the table query dialect
//! - [`schema`] - Column schema lookup ([`SchemaProvider`])
//! - [`mapper`] - Table and column resolution
//! - [`naming`] - Physical table and column names
//! - [`description`] - Index descriptions for each table type
//! - [`translate`] - Query translation ([`QueryTranslator`])
//! - [`combined`] - Combined queries ([`CombinedQuery`])
//! - [`error`] - Error types for parsing and translation
//!
//! # Quick Start
//!
//! Translate a query:
//!
//! ```
//! use std::sync::Arc;
//! use tablequery::{IndexDescription, InMemorySchemaProvider, QueryTranslator, TranslatorConfig};
//! use tablequery_core::{ColumnId, ColumnModel, ColumnType, IdAndVersion, ParameterValue};
//!
//! let provider = InMemorySchemaProvider::new().with_table(
//!     IdAndVersion::new(123),
//!     vec![
//!         ColumnModel::new(ColumnId::new(111), "foo", ColumnType::String),
//!         ColumnModel::new(ColumnId::new(222), "bar", ColumnType::Integer),
//!     ],
//! );
//! let translator = QueryTranslator::new(
//!     TranslatorConfig::new()
//!         .with_schema_provider(Arc::new(provider))
//!         .with_index_description(IndexDescription::table(IdAndVersion::new(123)))
//!         .with_user_id(1),
//! )
//! .unwrap();
//!
//! let translated = translator.translate("select foo from syn123 where bar = 1").unwrap();
//! assert_eq!(translated.sql(), "SELECT _C111_, ROW_ID, ROW_VERSION FROM T123 WHERE _C222_ = :b0");
//! assert_eq!(translated.parameters().get("b0"), Some(&ParameterValue::Integer(1)));
//! ```
//!
//! Combine a filter and a page window into a query:
//!
//! ```
//! use tablequery::combined::{QueryFilter, SingleValueOperator};
//! use tablequery::CombinedQuery;
//!
//! let combined = CombinedQuery::builder("select * from syn123")
//!     .with_additional_filters(vec![QueryFilter::single_value(
//!         "foo",
//!         SingleValueOperator::Equal,
//!         vec!["a".to_string()],
//!     )])
//!     .with_limit(Some(10))
//!     .build()
//!     .unwrap();
//! assert_eq!(combined.combined_sql(), "SELECT * FROM syn123 WHERE ( \"foo\" = 'a' ) LIMIT 10");
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod ast;
pub mod combined;
pub mod description;
pub mod error;
pub mod mapper;
pub mod naming;
pub mod parser;
pub mod schema;
pub mod translate;

// Re-export commonly used items at the crate root
pub use combined::{CombinedQuery, CombinedQueryBuilder};
pub use description::{IndexDescription, IndexDescriptionLookup, MetadataColumn};
pub use error::{ErrorKind, ParseError, ParseResult, TranslateError, TranslateResult, UnsupportedConstruct};
pub use mapper::TableAndColumnMapper;
pub use parser::{parse_expression, parse_query};
pub use schema::{EmptySchemaProvider, InMemorySchemaProvider, SchemaProvider};
pub use translate::{Parameters, QueryTranslator, SqlContext, TranslatedQuery, TranslatorConfig};
