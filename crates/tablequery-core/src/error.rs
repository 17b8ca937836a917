//! Error types for the core crate.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A table identifier could not be parsed.
    #[error("invalid table identifier: '{0}'")]
    InvalidTableId(String),

    /// A column type name is not known.
    #[error("unknown column type: '{0}'")]
    UnknownColumnType(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::InvalidTableId("synabc".to_string());
        assert_eq!(err.to_string(), "invalid table identifier: 'synabc'");

        let err = CoreError::UnknownColumnType("BLOB".to_string());
        assert_eq!(err.to_string(), "unknown column type: 'BLOB'");
    }
}
