//! Worst-case row size computation.
//!
//! Page sizes are derived from a byte budget, so every column type needs an
//! upper bound on the bytes a single value can occupy when rendered as text.

use crate::types::{ColumnModel, ColumnType};

/// Bytes needed for one UTF-8 character in the worst case.
pub const MAX_BYTES_PER_CHAR_UTF_8: u64 = 4;

/// Characters assumed for a string column without a declared size.
pub const DEFAULT_MAX_STRING_SIZE: u64 = 50;

/// Characters assumed for computed string values.
pub const MAX_ALLOWED_STRING_SIZE: u64 = 1000;

/// Elements assumed for a list column without a declared length.
pub const DEFAULT_MAX_LIST_LENGTH: u64 = 100;

/// Bytes of an integer or date rendered as text.
pub const MAX_INTEGER_BYTES_AS_STRING: u64 = 20;

/// Bytes of a double rendered as text.
pub const MAX_DOUBLE_BYTES_AS_STRING: u64 = 23;

/// Bytes of a boolean rendered as text.
pub const MAX_BOOLEAN_BYTES_AS_STRING: u64 = 5;

/// Bytes reserved for a JSON document.
pub const MAX_JSON_BYTES: u64 = MAX_ALLOWED_STRING_SIZE * MAX_BYTES_PER_CHAR_UTF_8;

/// The largest number of bytes one value of `column_type` can take.
///
/// `max_size` applies to strings; `max_list_length` multiplies the element
/// size of list types.
#[must_use]
pub fn max_size_for_type(
    column_type: ColumnType,
    max_size: Option<u64>,
    max_list_length: Option<u64>,
) -> u64 {
    if column_type.is_list() {
        let element = max_size_for_type(column_type.non_list_type(), max_size, None);
        return element.saturating_mul(max_list_length.unwrap_or(DEFAULT_MAX_LIST_LENGTH));
    }
    match column_type {
        ColumnType::String => {
            MAX_BYTES_PER_CHAR_UTF_8.saturating_mul(max_size.unwrap_or(DEFAULT_MAX_STRING_SIZE))
        }
        ColumnType::Integer | ColumnType::Date => MAX_INTEGER_BYTES_AS_STRING,
        ColumnType::Double => MAX_DOUBLE_BYTES_AS_STRING,
        ColumnType::Boolean => MAX_BOOLEAN_BYTES_AS_STRING,
        _ => MAX_JSON_BYTES,
    }
}

/// The largest number of bytes one value of `model` can take.
///
/// A computed string without a declared size counts at
/// [`MAX_ALLOWED_STRING_SIZE`].
#[must_use]
pub fn max_size_for_column(model: &ColumnModel) -> u64 {
    let max_size = match model.max_size() {
        None if model.id().is_none() && model.column_type() == ColumnType::String => {
            Some(MAX_ALLOWED_STRING_SIZE)
        }
        declared => declared,
    };
    max_size_for_type(model.column_type(), max_size, model.max_list_length())
}

/// Sum of the worst-case sizes of every column in `models`.
#[must_use]
pub fn max_row_size<'a>(models: impl IntoIterator<Item = &'a ColumnModel>) -> u64 {
    models
        .into_iter()
        .map(max_size_for_column)
        .fold(0, u64::saturating_add)
}

/// Rows that fit in a page of `max_bytes_per_page`, never less than one.
#[must_use]
pub fn max_rows_per_page(max_bytes_per_page: u64, max_row_size_bytes: u64) -> u64 {
    if max_row_size_bytes == 0 {
        return max_bytes_per_page.max(1);
    }
    (max_bytes_per_page / max_row_size_bytes).max(1)
}
