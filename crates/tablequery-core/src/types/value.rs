//! Values bound to placeholders of a compiled statement.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::column::ColumnType;

/// A natively typed value bound to a `:bN` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Double(f64),
    /// Boolean value
    Boolean(bool),
    /// UTF-8 string
    String(String),
}

impl ParameterValue {
    /// Convert literal text to the native representation of `column_type`.
    ///
    /// Text that does not parse as the target type is kept as a string, so
    /// the comparison is left to the store.
    #[must_use]
    pub fn parse_for_type(column_type: ColumnType, text: &str) -> Self {
        let parsed = match column_type.non_list_type() {
            ColumnType::Integer | ColumnType::Date => text.parse::<i64>().ok().map(Self::Integer),
            ColumnType::Double => text.parse::<f64>().ok().map(Self::Double),
            ColumnType::Boolean => text.parse::<bool>().ok().map(Self::Boolean),
            _ => None,
        };
        parsed.unwrap_or_else(|| Self::String(text.to_string()))
    }

    /// Returns the value as an integer if it is one.
    #[inline]
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float if it is one.
    #[inline]
    #[must_use]
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for ParameterValue {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_for_numeric_types() {
        assert_eq!(
            ParameterValue::parse_for_type(ColumnType::Integer, "12"),
            ParameterValue::Integer(12)
        );
        assert_eq!(
            ParameterValue::parse_for_type(ColumnType::Double, "1.5"),
            ParameterValue::Double(1.5)
        );
        assert_eq!(
            ParameterValue::parse_for_type(ColumnType::IntegerList, "3"),
            ParameterValue::Integer(3)
        );
    }

    #[test]
    fn parse_keeps_strings() {
        assert_eq!(
            ParameterValue::parse_for_type(ColumnType::String, "1"),
            ParameterValue::String("1".to_string())
        );
        // not a number, fall back to text
        assert_eq!(
            ParameterValue::parse_for_type(ColumnType::Integer, "abc"),
            ParameterValue::String("abc".to_string())
        );
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![
            ParameterValue::from(1_i64),
            ParameterValue::from("a"),
            ParameterValue::from(true),
        ])
        .unwrap();
        assert_eq!(json, r#"[1,"a",true]"#);
    }
}
