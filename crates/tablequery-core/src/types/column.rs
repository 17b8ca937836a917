//! Column descriptors and column types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::ColumnId;
use crate::error::CoreError;

/// The logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    /// Bounded UTF-8 text.
    String,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float, with NaN and infinities kept in a shadow column.
    Double,
    /// Milliseconds since the epoch.
    Date,
    /// True or false.
    Boolean,
    /// Arbitrary JSON document.
    Json,
    /// List of strings.
    StringList,
    /// List of integers.
    IntegerList,
    /// List of doubles.
    DoubleList,
    /// List of dates.
    DateList,
    /// List of booleans.
    BooleanList,
}

impl ColumnType {
    /// All column types, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::String,
        Self::Integer,
        Self::Double,
        Self::Date,
        Self::Boolean,
        Self::Json,
        Self::StringList,
        Self::IntegerList,
        Self::DoubleList,
        Self::DateList,
        Self::BooleanList,
    ];

    /// Returns `true` for the list variants.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::StringList
                | Self::IntegerList
                | Self::DoubleList
                | Self::DateList
                | Self::BooleanList
        )
    }

    /// The element type of a list type, or the type itself for scalars.
    #[must_use]
    pub const fn non_list_type(self) -> Self {
        match self {
            Self::StringList => Self::String,
            Self::IntegerList => Self::Integer,
            Self::DoubleList => Self::Double,
            Self::DateList => Self::Date,
            Self::BooleanList => Self::Boolean,
            other => other,
        }
    }

    /// The list type holding elements of this type, if one exists.
    #[must_use]
    pub const fn list_type(self) -> Option<Self> {
        match self {
            Self::String => Some(Self::StringList),
            Self::Integer => Some(Self::IntegerList),
            Self::Double => Some(Self::DoubleList),
            Self::Date => Some(Self::DateList),
            Self::Boolean => Some(Self::BooleanList),
            _ => None,
        }
    }

    /// The type name used by `CAST` in the physical store.
    #[must_use]
    pub const fn physical_cast_type(self) -> &'static str {
        match self {
            Self::String => "CHAR",
            Self::Integer | Self::Date => "SIGNED",
            Self::Boolean => "UNSIGNED",
            Self::Double => "DOUBLE",
            Self::Json
            | Self::StringList
            | Self::IntegerList
            | Self::DoubleList
            | Self::DateList
            | Self::BooleanList => "JSON",
        }
    }

    /// The canonical upper-case name of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Double => "DOUBLE",
            Self::Date => "DATE",
            Self::Boolean => "BOOLEAN",
            Self::Json => "JSON",
            Self::StringList => "STRING_LIST",
            Self::IntegerList => "INTEGER_LIST",
            Self::DoubleList => "DOUBLE_LIST",
            Self::DateList => "DATE_LIST",
            Self::BooleanList => "BOOLEAN_LIST",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownColumnType(s.to_string()))
    }
}

/// How a column may be offered as a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetType {
    /// A set of enumerable values.
    Enumeration,
    /// A min/max range.
    Range,
}

/// Facet metadata for a path inside a JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSubColumnModel {
    /// Display name of the sub-column.
    pub name: String,
    /// JSON path selecting the value, e.g. `$.foo`.
    pub json_path: String,
    /// Type the extracted value is cast to.
    pub column_type: ColumnType,
    /// How the sub-column is faceted.
    pub facet_type: FacetType,
}

impl JsonSubColumnModel {
    /// Create a new sub-column descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        json_path: impl Into<String>,
        column_type: ColumnType,
        facet_type: FacetType,
    ) -> Self {
        Self {
            name: name.into(),
            json_path: json_path.into(),
            column_type,
            facet_type,
        }
    }
}

/// Descriptor of one logical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnModel {
    /// Physical id; absent for computed columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ColumnId>,
    name: String,
    column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_list_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    facet_type: Option<FacetType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    json_sub_columns: Vec<JsonSubColumnModel>,
}

impl ColumnModel {
    /// Create a descriptor for a stored column.
    #[must_use]
    pub fn new(id: ColumnId, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: Some(id),
            ..Self::computed(name, column_type)
        }
    }

    /// Create a descriptor for a computed column that has no physical id.
    #[must_use]
    pub fn computed(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: None,
            name: name.into(),
            column_type,
            max_size: None,
            max_list_length: None,
            facet_type: None,
            json_sub_columns: Vec::new(),
        }
    }

    /// Set the maximum number of characters.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Set the maximum number of list elements.
    #[must_use]
    pub const fn with_max_list_length(mut self, max_list_length: u64) -> Self {
        self.max_list_length = Some(max_list_length);
        self
    }

    /// Set the facet type.
    #[must_use]
    pub const fn with_facet_type(mut self, facet_type: FacetType) -> Self {
        self.facet_type = Some(facet_type);
        self
    }

    /// Add a JSON sub-column.
    #[must_use]
    pub fn with_json_sub_column(mut self, sub_column: JsonSubColumnModel) -> Self {
        self.json_sub_columns.push(sub_column);
        self
    }

    /// Replace the id.
    #[must_use]
    pub const fn with_id(mut self, id: Option<ColumnId>) -> Self {
        self.id = id;
        self
    }

    /// Replace the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The physical id, if any.
    #[must_use]
    pub const fn id(&self) -> Option<ColumnId> {
        self.id
    }

    /// The column name as users write it.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column type.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Maximum number of characters, if declared.
    #[must_use]
    pub const fn max_size(&self) -> Option<u64> {
        self.max_size
    }

    /// Maximum number of list elements, if declared.
    #[must_use]
    pub const fn max_list_length(&self) -> Option<u64> {
        self.max_list_length
    }

    /// The facet type, if the column is faceted.
    #[must_use]
    pub const fn facet_type(&self) -> Option<FacetType> {
        self.facet_type
    }

    /// JSON sub-columns declared for this column.
    #[must_use]
    pub fn json_sub_columns(&self) -> &[JsonSubColumnModel] {
        &self.json_sub_columns
    }
}
