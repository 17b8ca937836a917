//! Combined query tests for `tablequery`.
//!
//! These tests verify:
//! - Merging facets, filters, sorting and paging into a base query
//! - Translating the combined query to physical SQL
//! - Count and row-id follow-up queries
//! - The JSON wire format of the overrides

use std::collections::HashMap;
use std::sync::Arc;

use tablequery::combined::{
    FacetColumnRequest, MultiValueFunction, QueryFilter, SingleValueOperator, SortDirection, SortItem,
    NULL_VALUE_KEYWORD,
};
use tablequery::error::{ErrorKind, TranslateError};
use tablequery::{CombinedQuery, IndexDescription, InMemorySchemaProvider, QueryTranslator, TranslatorConfig};
use tablequery_core::{ColumnId, ColumnModel, ColumnType, FacetType, IdAndVersion, ParameterValue};

// ============================================================================
// Fixtures
// ============================================================================

fn syn(id: u64) -> IdAndVersion {
    IdAndVersion::new(id)
}

fn schema() -> Vec<ColumnModel> {
    vec![
        ColumnModel::new(ColumnId::new(111), "foo", ColumnType::String).with_facet_type(FacetType::Enumeration),
        ColumnModel::new(ColumnId::new(222), "bar", ColumnType::Integer).with_facet_type(FacetType::Range),
        ColumnModel::new(ColumnId::new(444), "tags", ColumnType::StringList)
            .with_facet_type(FacetType::Enumeration),
    ]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn translator(description: IndexDescription) -> QueryTranslator {
    let provider = InMemorySchemaProvider::new()
        .with_table(syn(123), schema())
        .with_table(syn(789), schema().into_iter().take(2).collect());
    QueryTranslator::new(
        TranslatorConfig::new()
            .with_schema_provider(Arc::new(provider))
            .with_index_description(description)
            .with_user_id(1),
    )
    .unwrap()
}

// ============================================================================
// Combination Tests
// ============================================================================

mod combination {
    use super::*;

    #[test]
    fn every_override_in_clause_order() {
        let combined = CombinedQuery::builder("select foo, bar from syn123 where bar > 0 order by foo")
            .with_schema(schema())
            .with_selected_facets(vec![
                FacetColumnRequest::values("foo", strings(&["a", "b"])),
                FacetColumnRequest::range("bar", Some("1".to_string()), Some("5".to_string())),
            ])
            .with_additional_filters(vec![QueryFilter::single_value(
                "foo",
                SingleValueOperator::Like,
                strings(&["x%"]),
            )])
            .with_sort(vec![SortItem::with_direction("bar", SortDirection::Desc)])
            .with_limit(Some(10))
            .with_offset(Some(20))
            .build()
            .unwrap();
        assert_eq!(
            combined.combined_sql(),
            "SELECT foo, bar FROM syn123 WHERE ( bar > 0 ) AND ( ( \"foo\" = 'a' OR \"foo\" = 'b' ) \
             AND ( \"bar\" BETWEEN '1' AND '5' ) AND ( \"foo\" LIKE 'x%' ) ) \
             ORDER BY \"bar\" DESC, foo LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn empty_overrides_render_the_canonical_query() {
        let sql = "select foo, count(*) from syn123 where bar in (1, 2) group by foo order by foo desc limit 5";
        let combined = CombinedQuery::builder(sql).build().unwrap();
        assert_eq!(
            combined.combined_sql(),
            "SELECT foo, COUNT(*) FROM syn123 WHERE bar IN ( 1, 2 ) GROUP BY foo ORDER BY foo DESC LIMIT 5"
        );
        assert_eq!(combined.to_string(), combined.combined_sql());
    }

    #[test]
    fn filters_without_a_where_stand_alone() {
        let combined = CombinedQuery::builder("select foo from syn123")
            .with_additional_filters(vec![
                QueryFilter::multi_value("tags", MultiValueFunction::HasLike, strings(&["a%", "b%"])),
                QueryFilter::text_matches("hello"),
            ])
            .build()
            .unwrap();
        assert_eq!(
            combined.combined_sql(),
            "SELECT foo FROM syn123 WHERE ( \"tags\" HAS_LIKE ( 'a%', 'b%' ) ) AND ( TEXT_MATCHES('hello') )"
        );
    }

    #[test]
    fn defining_filters_go_to_defining_where() {
        let combined = CombinedQuery::builder("select foo from syn789 where bar = 1")
            .with_additional_filters(vec![
                QueryFilter::single_value("foo", SingleValueOperator::Equal, strings(&["a"])).defining(),
                QueryFilter::single_value("bar", SingleValueOperator::In, strings(&["1", "2"])),
            ])
            .build()
            .unwrap();
        assert_eq!(
            combined.combined_sql(),
            "SELECT foo FROM syn789 DEFINING_WHERE ( \"foo\" = 'a' ) \
             WHERE ( bar = 1 ) AND ( \"bar\" IN ( '1', '2' ) )"
        );
    }

    #[test]
    fn null_facet_values() {
        let combined = CombinedQuery::builder("select foo from syn123")
            .with_schema(schema())
            .with_selected_facets(vec![FacetColumnRequest::values("foo", strings(&[NULL_VALUE_KEYWORD, "a"]))])
            .build()
            .unwrap();
        assert_eq!(
            combined.combined_sql(),
            "SELECT foo FROM syn123 WHERE ( \"foo\" IS NULL OR \"foo\" = 'a' )"
        );
    }

    #[test]
    fn sort_overrides_come_first_without_deduplication() {
        let combined = CombinedQuery::builder("select foo from syn123 order by foo desc")
            .with_sort(vec![SortItem::new("foo"), SortItem::new("max(bar)")])
            .build()
            .unwrap();
        assert_eq!(
            combined.combined_sql(),
            "SELECT foo FROM syn123 ORDER BY \"foo\" ASC, MAX(bar) ASC, foo DESC"
        );
    }

    #[test]
    fn paging_replaces_each_value() {
        let offset_only = CombinedQuery::builder("select foo from syn123 limit 10 offset 2")
            .with_offset(Some(30))
            .build()
            .unwrap();
        assert_eq!(offset_only.combined_sql(), "SELECT foo FROM syn123 LIMIT 10 OFFSET 30");

        let limit_only = CombinedQuery::builder("select foo from syn123 limit 10 offset 2")
            .with_limit(Some(3))
            .build()
            .unwrap();
        assert_eq!(limit_only.combined_sql(), "SELECT foo FROM syn123 LIMIT 3 OFFSET 2");
    }

    #[test]
    fn union_parts_are_all_filtered() {
        let combined = CombinedQuery::builder("select foo from syn1 union select foo from syn2")
            .with_additional_filters(vec![QueryFilter::single_value(
                "foo",
                SingleValueOperator::Equal,
                strings(&["a"]),
            )])
            .with_sort(vec![SortItem::new("foo")])
            .build()
            .unwrap();
        assert_eq!(
            combined.combined_sql(),
            "SELECT foo FROM syn1 WHERE ( \"foo\" = 'a' ) UNION SELECT foo FROM syn2 WHERE ( \"foo\" = 'a' ) \
             ORDER BY \"foo\" ASC"
        );
        assert_eq!(combined.count_query(), None);
    }
}

// ============================================================================
// Translation Tests
// ============================================================================

mod translation {
    use super::*;

    #[test]
    fn combined_query_translates_with_ordered_bindings() {
        let combined = CombinedQuery::builder("select foo, bar from syn123 where bar > 0 order by foo")
            .with_schema(schema())
            .with_selected_facets(vec![
                FacetColumnRequest::values("foo", strings(&["a", "b"])),
                FacetColumnRequest::range("bar", Some("1".to_string()), Some("5".to_string())),
            ])
            .with_additional_filters(vec![QueryFilter::single_value(
                "foo",
                SingleValueOperator::Like,
                strings(&["x%"]),
            )])
            .with_sort(vec![SortItem::with_direction("bar", SortDirection::Desc)])
            .with_limit(Some(10))
            .with_offset(Some(20))
            .build()
            .unwrap();

        let translated =
            translator(IndexDescription::table(syn(123))).translate_query(combined.into_query()).unwrap();
        assert_eq!(
            translated.sql(),
            "SELECT _C111_, _C222_, ROW_ID, ROW_VERSION FROM T123 WHERE ( _C222_ > :b0 ) \
             AND ( ( _C111_ = :b1 OR _C111_ = :b2 ) AND ( _C222_ BETWEEN :b3 AND :b4 ) AND ( _C111_ LIKE :b5 ) ) \
             ORDER BY _C222_ DESC, _C111_ LIMIT :b6 OFFSET :b7"
        );
        let values: Vec<&ParameterValue> = translated.parameters().iter().map(|(_, v)| v).collect();
        assert_eq!(
            values,
            vec![
                &ParameterValue::Integer(0),
                &ParameterValue::String("a".to_string()),
                &ParameterValue::String("b".to_string()),
                &ParameterValue::Integer(1),
                &ParameterValue::Integer(5),
                &ParameterValue::String("x%".to_string()),
                &ParameterValue::Integer(10),
                &ParameterValue::Integer(20),
            ]
        );
    }

    #[test]
    fn list_facet_translates_to_side_table_lookup() {
        let combined = CombinedQuery::builder("select foo from syn123")
            .with_schema(schema())
            .with_selected_facets(vec![FacetColumnRequest::values("tags", strings(&["x"]))])
            .build()
            .unwrap();
        let translated =
            translator(IndexDescription::table(syn(123))).translate_query(combined.into_query()).unwrap();
        assert_eq!(
            translated.sql(),
            "SELECT _C111_, ROW_ID, ROW_VERSION FROM T123 WHERE ( ROW_ID IN ( SELECT ROW_ID_REF_C444_ \
             FROM T123_INDEX_C444_ WHERE _C444__UNNEST IN ( :b0 ) ) )"
        );
    }

    #[test]
    fn defining_filter_reaches_the_virtual_table() {
        let lookup: HashMap<IdAndVersion, IndexDescription> =
            HashMap::from([(syn(123), IndexDescription::table(syn(123)))]);
        let description = IndexDescription::virtual_table(syn(789), "select foo, bar from syn123", Arc::new(lookup));

        let combined = CombinedQuery::builder("select foo from syn789")
            .with_additional_filters(vec![
                QueryFilter::single_value("foo", SingleValueOperator::Equal, strings(&["a"])).defining(),
            ])
            .build()
            .unwrap();
        let translated = translator(description).translate_query(combined.into_query()).unwrap();
        assert_eq!(
            translated.sql(),
            "WITH T789 (_C111_, _C222_) AS (SELECT _C111_, _C222_ FROM T123 WHERE ( _C111_ = :b0 )) \
             SELECT _C111_ FROM T789"
        );
    }

    #[test]
    fn count_query_translates() {
        let combined = CombinedQuery::try_from("select foo, bar from syn123 where bar > 0 order by foo limit 10").unwrap();
        let count = combined.count_query().unwrap();
        assert_eq!(count, "SELECT COUNT(*) FROM syn123 WHERE bar > 0");

        let translated = translator(IndexDescription::table(syn(123))).translate(&count).unwrap();
        assert_eq!(translated.sql(), "SELECT COUNT(*) FROM T123 WHERE _C222_ > :b0");
        assert!(translated.is_aggregated());
    }

    #[test]
    fn row_id_query_translates() {
        let combined = CombinedQuery::try_from("select foo from syn123 where bar > 0 order by foo").unwrap();
        let rows = combined.row_id_and_version_query(5000).unwrap();
        let translated = translator(IndexDescription::table(syn(123))).translate(&rows).unwrap();
        assert!(translated.sql().starts_with("SELECT ROW_ID, ROW_VERSION"));
        assert!(translated.sql().ends_with("LIMIT :b1"));
        assert_eq!(translated.parameters().get("b1"), Some(&ParameterValue::Integer(5000)));
    }
}

// ============================================================================
// Wire Format Tests
// ============================================================================

mod wire_format {
    use super::*;

    #[test]
    fn overrides_from_json() {
        let facets: Vec<FacetColumnRequest> = serde_json::from_str(
            r#"[{"concreteType":"FacetColumnValuesRequest","columnName":"foo","facetValues":["a"]}]"#,
        )
        .unwrap();
        let filters: Vec<QueryFilter> = serde_json::from_str(
            r#"[{"concreteType":"TextMatchesQueryFilter","searchExpression":"cats"}]"#,
        )
        .unwrap();
        let sort: Vec<SortItem> = serde_json::from_str(r#"[{"column":"bar","direction":"DESC"}]"#).unwrap();

        let combined = CombinedQuery::builder("select foo from syn123")
            .with_schema(schema())
            .with_selected_facets(facets)
            .with_additional_filters(filters)
            .with_sort(sort)
            .build()
            .unwrap();
        assert_eq!(
            combined.combined_sql(),
            "SELECT foo FROM syn123 WHERE ( \"foo\" = 'a' ) AND ( TEXT_MATCHES('cats') ) ORDER BY \"bar\" DESC"
        );
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn unknown_facet_column() {
        let err = CombinedQuery::builder("select foo from syn123")
            .with_schema(schema())
            .with_selected_facets(vec![FacetColumnRequest::values("nope", strings(&["a"]))])
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Facet column 'nope' does not exist in the schema");
        assert_eq!(err.kind(), ErrorKind::UnresolvedIdentifier);
    }

    #[test]
    fn incomplete_filter() {
        let err = CombinedQuery::builder("select foo from syn123")
            .with_additional_filters(vec![QueryFilter::single_value("foo", SingleValueOperator::Equal, vec![])])
            .build()
            .unwrap_err();
        assert_eq!(err, TranslateError::MissingInput("QueryFilter.values"));
        assert_eq!(err.to_string(), "QueryFilter.values is required.");
    }

    #[test]
    fn malformed_base_query() {
        let err = CombinedQuery::builder("select foo syn123").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
}
