//! Physical names in the backing store.
//!
//! Logical tables and columns never appear in translated SQL. Tables are
//! addressed as `T{id}` or `T{id}_{version}`, columns as `_C{id}_`, and a few
//! fixed metadata columns exist on every table.

use tablequery_core::{ColumnId, IdAndVersion};

use crate::ast::{CaseExpr, ColumnReference, Expr};

/// Row identifier column.
pub const ROW_ID: &str = "ROW_ID";

/// Row version column.
pub const ROW_VERSION: &str = "ROW_VERSION";

/// Entity etag column of view rows.
pub const ROW_ETAG: &str = "ROW_ETAG";

/// Authorization scope column of view rows.
pub const ROW_BENEFACTOR: &str = "ROW_BENEFACTOR";

/// Full-text search document column.
pub const ROW_SEARCH_CONTENT: &str = "ROW_SEARCH_CONTENT";

/// Prefix of generated table aliases.
const ALIAS_PREFIX: &str = "_A";

/// Prefix of bind placeholders.
const BIND_PREFIX: &str = "b";

/// Physical name of a table: `T123` or `T123_4`.
#[must_use]
pub fn table_name(table: &IdAndVersion) -> String {
    match table.version() {
        Some(version) => format!("T{}_{version}", table.id()),
        None => format!("T{}", table.id()),
    }
}

/// Physical name of a column: `_C111_`.
#[must_use]
pub fn column_name(id: ColumnId) -> String {
    format!("_C{id}_")
}

/// Shadow column holding NaN and infinity markers for a DOUBLE column.
#[must_use]
pub fn double_column_name(id: ColumnId) -> String {
    format!("_DBL_C{id}_")
}

/// Side table holding one row per element of a list column.
#[must_use]
pub fn list_index_table_name(table: &IdAndVersion, column: ColumnId) -> String {
    format!("{}_INDEX_C{column}_", table_name(table))
}

/// Element column of a list side table.
#[must_use]
pub fn unnested_column_name(id: ColumnId) -> String {
    format!("{}_UNNEST", column_name(id))
}

/// Column of a list side table pointing back at the owning row.
#[must_use]
pub fn row_id_ref_column_name(id: ColumnId) -> String {
    format!("ROW_ID_REF_C{id}_")
}

/// Alias of the `index`th table in a multi-table query.
#[must_use]
pub fn table_alias(index: usize) -> String {
    format!("{ALIAS_PREFIX}{index}")
}

/// Name of the `index`th bind placeholder.
#[must_use]
pub fn bind_name(index: usize) -> String {
    format!("{BIND_PREFIX}{index}")
}

/// Returns `true` if `name` is one of the metadata columns every table carries.
#[must_use]
pub fn is_metadata_column(name: &str) -> bool {
    [ROW_ID, ROW_VERSION, ROW_ETAG, ROW_BENEFACTOR].iter().any(|m| m.eq_ignore_ascii_case(name))
}

fn reference(qualifier: Option<&str>, name: String) -> ColumnReference {
    match qualifier {
        Some(q) => ColumnReference::qualified(q, name),
        None => ColumnReference::simple(name),
    }
}

/// A physical column reference, qualified when `qualifier` is given.
#[must_use]
pub fn column_reference(qualifier: Option<&str>, id: ColumnId) -> ColumnReference {
    reference(qualifier, column_name(id))
}

/// A metadata column reference, qualified when `qualifier` is given.
#[must_use]
pub fn metadata_reference(qualifier: Option<&str>, name: &str) -> ColumnReference {
    reference(qualifier, name.to_string())
}

/// Reads a DOUBLE column through its shadow column:
/// `CASE WHEN _DBL_C1_ IS NULL THEN _C1_ ELSE _DBL_C1_ END`.
#[must_use]
pub fn double_guard(qualifier: Option<&str>, id: ColumnId) -> Expr {
    let shadow = Expr::Column(reference(qualifier, double_column_name(id)));
    Expr::Case(CaseExpr {
        operand: None,
        when_clauses: vec![(
            shadow.clone().is_null(false),
            Expr::Column(column_reference(qualifier, id)),
        )],
        else_result: Some(Box::new(shadow)),
    })
}

/// `( _DBL_C1_ IS NOT NULL AND _DBL_C1_ = 'NaN' )`.
#[must_use]
pub fn is_nan(qualifier: Option<&str>, id: ColumnId) -> Expr {
    let shadow = Expr::Column(reference(qualifier, double_column_name(id)));
    shadow.clone().is_null(true).and(shadow.eq(Expr::string("NaN"))).nested()
}

/// `( _DBL_C1_ IS NOT NULL AND _DBL_C1_ IN ( '-Infinity', 'Infinity' ) )`.
#[must_use]
pub fn is_infinity(qualifier: Option<&str>, id: ColumnId) -> Expr {
    let shadow = Expr::Column(reference(qualifier, double_column_name(id)));
    let in_list = Expr::InList {
        expr: Box::new(shadow.clone()),
        list: vec![Expr::string("-Infinity"), Expr::string("Infinity")],
        negated: false,
    };
    shadow.is_null(true).and(in_list).nested()
}

/// `IFNULL(ROW_BENEFACTOR,-1)`, qualified when `qualifier` is given.
#[must_use]
pub fn benefactor_column(qualifier: Option<&str>) -> Expr {
    Expr::function(
        "IFNULL",
        vec![Expr::Column(metadata_reference(qualifier, ROW_BENEFACTOR)), Expr::number(-1)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names() {
        assert_eq!(table_name(&IdAndVersion::new(123)), "T123");
        assert_eq!(table_name(&IdAndVersion::with_version(123, 4)), "T123_4");
    }

    #[test]
    fn column_names() {
        let id = ColumnId::new(111);
        assert_eq!(column_name(id), "_C111_");
        assert_eq!(double_column_name(id), "_DBL_C111_");
        assert_eq!(unnested_column_name(id), "_C111__UNNEST");
        assert_eq!(row_id_ref_column_name(id), "ROW_ID_REF_C111_");
        assert_eq!(
            list_index_table_name(&IdAndVersion::with_version(123, 456), id),
            "T123_456_INDEX_C111_"
        );
    }

    #[test]
    fn generated_names() {
        assert_eq!(table_alias(0), "_A0");
        assert_eq!(bind_name(12), "b12");
    }

    #[test]
    fn double_expressions() {
        let id = ColumnId::new(777);
        assert_eq!(
            double_guard(None, id).to_string(),
            "CASE WHEN _DBL_C777_ IS NULL THEN _C777_ ELSE _DBL_C777_ END"
        );
        assert_eq!(
            double_guard(Some("_A1"), id).to_string(),
            "CASE WHEN _A1._DBL_C777_ IS NULL THEN _A1._C777_ ELSE _A1._DBL_C777_ END"
        );
        assert_eq!(is_nan(None, id).to_string(), "( _DBL_C777_ IS NOT NULL AND _DBL_C777_ = 'NaN' )");
        assert_eq!(
            is_infinity(None, id).to_string(),
            "( _DBL_C777_ IS NOT NULL AND _DBL_C777_ IN ( '-Infinity', 'Infinity' ) )"
        );
    }

    #[test]
    fn benefactor() {
        assert_eq!(benefactor_column(None).to_string(), "IFNULL(ROW_BENEFACTOR,-1)");
        assert_eq!(benefactor_column(Some("_A0")).to_string(), "IFNULL(_A0.ROW_BENEFACTOR,-1)");
    }

    #[test]
    fn metadata_names() {
        assert!(is_metadata_column("ROW_ID"));
        assert!(is_metadata_column("row_version"));
        assert!(!is_metadata_column("ROW_SEARCH_CONTENT"));
        assert!(!is_metadata_column("foo"));
    }
}
