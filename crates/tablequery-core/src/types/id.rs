//! Identifiers for tables and columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Prefix carried by user-facing table identifiers (`syn123`).
const TABLE_ID_PREFIX: &str = "syn";

/// Identifier of a table, optionally pinned to a snapshot version.
///
/// The textual form is `syn{id}` or `syn{id}.{version}`. The `syn` prefix is
/// optional and case-insensitive when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdAndVersion {
    id: u64,
    version: Option<u64>,
}

impl IdAndVersion {
    /// Create an identifier for the current version of a table.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self { id, version: None }
    }

    /// Create an identifier pinned to a specific version.
    #[must_use]
    pub const fn with_version(id: u64, version: u64) -> Self {
        Self {
            id,
            version: Some(version),
        }
    }

    /// The numeric table id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The snapshot version, if any.
    #[must_use]
    pub const fn version(&self) -> Option<u64> {
        self.version
    }
}

impl FromStr for IdAndVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidTableId(s.to_string());
        let trimmed = s.trim();
        let has_prefix = trimmed
            .as_bytes()
            .get(..TABLE_ID_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(TABLE_ID_PREFIX.as_bytes()));
        // An ASCII prefix ends on a char boundary.
        let body = if has_prefix { &trimmed[TABLE_ID_PREFIX.len()..] } else { trimmed };

        let (id_part, version_part) = match body.split_once('.') {
            Some((id, version)) => (id, Some(version)),
            None => (body, None),
        };
        let parse_digits = |part: &str| -> Result<u64, CoreError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        };

        let id = parse_digits(id_part)?;
        match version_part {
            Some(version) => Ok(Self::with_version(id, parse_digits(version)?)),
            None => Ok(Self::new(id)),
        }
    }
}

impl fmt::Display for IdAndVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TABLE_ID_PREFIX}{}", self.id)?;
        if let Some(version) = self.version {
            write!(f, ".{version}")?;
        }
        Ok(())
    }
}

/// Identifier of a column descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(u64);

impl ColumnId {
    /// Create a new `ColumnId` from a raw u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ColumnId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
