//! LIMIT and OFFSET arithmetic.
//!
//! A query may carry its own window while the caller asks for a page inside
//! it, or a page-size budget caps the rows returned. These helpers combine
//! the two without widening the window the query asked for.

use crate::ast::{Expr, Literal, Pagination};
use crate::error::{ParseError, TranslateResult};

/// The limit used when none is given.
pub const UNBOUNDED_LIMIT: u64 = i64::MAX.unsigned_abs();

/// Reads a LIMIT or OFFSET value written as a number.
///
/// # Errors
///
/// Returns an error if the value is not a non-negative integer literal.
pub fn pagination_value(expr: &Expr) -> TranslateResult<u64> {
    match expr {
        Expr::Literal(Literal::Number(text)) => text
            .parse()
            .map_err(|_| ParseError::InvalidLiteral(format!("'{text}' is not a valid row count")).into()),
        other => Err(ParseError::InvalidLiteral(format!("'{other}' is not a valid row count")).into()),
    }
}

/// The limit and offset of `pagination`, if present.
///
/// # Errors
///
/// Returns an error if either value is not an integer literal.
pub fn window(pagination: Option<&Pagination>) -> TranslateResult<(Option<u64>, Option<u64>)> {
    match pagination {
        None => Ok((None, None)),
        Some(p) => {
            let limit = pagination_value(&p.limit)?;
            let offset = p.offset.as_ref().map(pagination_value).transpose()?;
            Ok((Some(limit), offset))
        }
    }
}

/// Narrows the window of a query by a requested offset and limit.
///
/// The offsets add up. The limit is the smaller of the requested limit and
/// what remains of the query's own limit after the requested offset.
/// Without a request the pagination is returned unchanged.
///
/// # Errors
///
/// Returns an error if the query's own window is not made of integer literals.
pub fn override_pagination(
    pagination: Option<Pagination>,
    offset: Option<u64>,
    limit: Option<u64>,
) -> TranslateResult<Option<Pagination>> {
    if offset.is_none() && limit.is_none() {
        return Ok(pagination);
    }
    let limit_from_request = limit.unwrap_or(UNBOUNDED_LIMIT);
    let offset_from_request = offset.unwrap_or(0);

    let (query_limit, query_offset) = window(pagination.as_ref())?;
    let limit_from_query = query_limit.unwrap_or(UNBOUNDED_LIMIT).saturating_sub(offset_from_request);
    let offset = query_offset.unwrap_or(0).saturating_add(offset_from_request);

    Ok(Some(Pagination::new(limit_from_request.min(limit_from_query), Some(offset))))
}

/// Caps the limit at `max_rows_per_page`.
///
/// A query without pagination gets the first page.
///
/// # Errors
///
/// Returns an error if the query's limit is not an integer literal.
pub fn limit_max_rows_per_page(
    pagination: Option<Pagination>,
    max_rows_per_page: Option<u64>,
) -> TranslateResult<Option<Pagination>> {
    let Some(max_rows) = max_rows_per_page else {
        return Ok(pagination);
    };
    let Some(pagination) = pagination else {
        return Ok(Some(Pagination::new(max_rows, Some(0))));
    };
    if pagination_value(&pagination.limit)? > max_rows {
        return Ok(Some(Pagination { limit: Expr::number(max_rows), offset: pagination.offset }));
    }
    Ok(Some(pagination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn page(limit: u64, offset: Option<u64>) -> Option<Pagination> {
        Some(Pagination::new(limit, offset))
    }

    #[test]
    fn no_override_is_identity() {
        assert_eq!(override_pagination(page(10, Some(3)), None, None).unwrap(), page(10, Some(3)));
        assert_eq!(override_pagination(None, None, None).unwrap(), None);
    }

    #[test]
    fn override_without_query_window() {
        assert_eq!(override_pagination(None, Some(5), Some(10)).unwrap(), page(10, Some(5)));
        assert_eq!(override_pagination(None, Some(5), None).unwrap(), page(UNBOUNDED_LIMIT - 5, Some(5)));
    }

    #[test]
    fn override_narrows_query_window() {
        // rows 10..110 of the query, asking for 20 rows starting at 50
        assert_eq!(override_pagination(page(100, Some(10)), Some(50), Some(20)).unwrap(), page(20, Some(60)));
        // only 30 rows remain after skipping 70
        assert_eq!(override_pagination(page(100, Some(10)), Some(70), Some(50)).unwrap(), page(30, Some(80)));
        // skipping past the end
        assert_eq!(override_pagination(page(10, None), Some(20), Some(5)).unwrap(), page(0, Some(20)));
    }

    #[test]
    fn max_rows_per_page() {
        assert_eq!(limit_max_rows_per_page(None, None).unwrap(), None);
        assert_eq!(limit_max_rows_per_page(None, Some(10)).unwrap(), page(10, Some(0)));
        assert_eq!(limit_max_rows_per_page(page(100, Some(4)), Some(10)).unwrap(), page(10, Some(4)));
        assert_eq!(limit_max_rows_per_page(page(100, None), Some(10)).unwrap(), page(10, None));
        assert_eq!(limit_max_rows_per_page(page(5, Some(4)), Some(10)).unwrap(), page(5, Some(4)));
    }

    #[test]
    fn non_numeric_limit() {
        let pagination = Pagination { limit: Expr::Parameter("b0".to_string()), offset: None };
        assert!(limit_max_rows_per_page(Some(pagination), Some(10)).is_err());
    }

    proptest! {
        #[test]
        fn override_never_widens(
            limit in 0u64..10_000,
            offset in 0u64..10_000,
            request_limit in 0u64..10_000,
            request_offset in 0u64..10_000,
        ) {
            let result = override_pagination(page(limit, Some(offset)), Some(request_offset), Some(request_limit))
                .unwrap()
                .unwrap();
            let (new_limit, new_offset) = window(Some(&result)).unwrap();
            let (new_limit, new_offset) = (new_limit.unwrap(), new_offset.unwrap());
            prop_assert_eq!(new_offset, offset + request_offset);
            prop_assert!(new_limit <= request_limit);
            prop_assert!(new_offset + new_limit <= offset + limit.max(request_offset));
        }

        #[test]
        fn capped_limit_never_exceeds_max(limit in 0u64..10_000, max in 1u64..1_000) {
            let result = limit_max_rows_per_page(page(limit, None), Some(max)).unwrap().unwrap();
            let (new_limit, _) = window(Some(&result)).unwrap();
            prop_assert_eq!(new_limit.unwrap(), limit.min(max));
        }
    }
}
