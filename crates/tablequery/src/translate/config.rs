//! Translator configuration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::description::IndexDescription;
use crate::schema::SchemaProvider;

/// Why a query is being translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlContext {
    /// A user query: row ids are projected and DOUBLE columns are guarded.
    #[default]
    Query,
    /// The defining query of a materialized view: raw values are copied and
    /// benefactor columns of views are carried along.
    Build,
}

/// Configuration for a [`QueryTranslator`](super::QueryTranslator).
///
/// The schema provider, index description and user id are required; the
/// rest default to a plain query without paging.
#[derive(Clone, Default)]
pub struct TranslatorConfig {
    pub(crate) schema_provider: Option<Arc<dyn SchemaProvider>>,
    pub(crate) index_description: Option<IndexDescription>,
    pub(crate) user_id: Option<i64>,
    pub(crate) context: SqlContext,
    pub(crate) include_entity_etag: bool,
    pub(crate) max_bytes_per_page: Option<u64>,
    pub(crate) override_offset: Option<u64>,
    pub(crate) override_limit: Option<u64>,
}

impl TranslatorConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider of table schemas.
    #[must_use]
    pub fn with_schema_provider(mut self, provider: Arc<dyn SchemaProvider>) -> Self {
        self.schema_provider = Some(provider);
        self
    }

    /// Sets the description of what backs the query.
    #[must_use]
    pub fn with_index_description(mut self, description: IndexDescription) -> Self {
        self.index_description = Some(description);
        self
    }

    /// Sets the id of the user running the query, bound for `CURRENT_USER()`.
    #[must_use]
    pub const fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the translation context.
    #[must_use]
    pub const fn with_context(mut self, context: SqlContext) -> Self {
        self.context = context;
        self
    }

    /// Projects `ROW_ETAG` for views.
    #[must_use]
    pub const fn with_include_entity_etag(mut self, include: bool) -> Self {
        self.include_entity_etag = include;
        self
    }

    /// Limits each page to the rows that fit in `max_bytes_per_page`.
    #[must_use]
    pub const fn with_max_bytes_per_page(mut self, max_bytes_per_page: u64) -> Self {
        self.max_bytes_per_page = Some(max_bytes_per_page);
        self
    }

    /// Narrows the query window by an extra offset and limit.
    #[must_use]
    pub const fn with_override_pagination(mut self, offset: Option<u64>, limit: Option<u64>) -> Self {
        self.override_offset = offset;
        self.override_limit = limit;
        self
    }
}

impl fmt::Debug for TranslatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorConfig")
            .field("has_schema_provider", &self.schema_provider.is_some())
            .field("index_description", &self.index_description)
            .field("user_id", &self.user_id)
            .field("context", &self.context)
            .field("include_entity_etag", &self.include_entity_etag)
            .field("max_bytes_per_page", &self.max_bytes_per_page)
            .field("override_offset", &self.override_offset)
            .field("override_limit", &self.override_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EmptySchemaProvider;
    use tablequery_core::IdAndVersion;

    #[test]
    fn defaults() {
        let config = TranslatorConfig::new();
        assert_eq!(config.context, SqlContext::Query);
        assert!(!config.include_entity_etag);
        assert!(config.schema_provider.is_none());
        assert!(config.max_bytes_per_page.is_none());
    }

    #[test]
    fn builder() {
        let config = TranslatorConfig::new()
            .with_schema_provider(Arc::new(EmptySchemaProvider))
            .with_index_description(IndexDescription::table(IdAndVersion::new(1)))
            .with_user_id(42)
            .with_context(SqlContext::Build)
            .with_include_entity_etag(true)
            .with_max_bytes_per_page(1000)
            .with_override_pagination(Some(10), None);
        assert!(config.schema_provider.is_some());
        assert_eq!(config.user_id, Some(42));
        assert_eq!(config.context, SqlContext::Build);
        assert!(config.include_entity_etag);
        assert_eq!(config.max_bytes_per_page, Some(1000));
        assert_eq!(config.override_offset, Some(10));
        assert_eq!(config.override_limit, None);
        assert!(format!("{config:?}").contains("has_schema_provider: true"));
    }

    #[test]
    fn context_serde() {
        assert_eq!(serde_json::to_string(&SqlContext::Build).unwrap(), "\"build\"");
    }
}
