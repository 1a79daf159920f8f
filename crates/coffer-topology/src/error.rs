//! Error types for topology derivation.

use thiserror::Error;

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors that can occur while deriving a topology.
///
/// Every variant is a synchronous rejection of the input; no partial
/// topology is produced when one is returned.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// A required field is empty or malformed.
    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        /// The offending input field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The replication region list repeats an entry.
    #[error("Duplicate replication region: {0}")]
    DuplicateRegion(String),

    /// A generated document failed validation.
    #[error("Core error: {0}")]
    Core(#[from] coffer_core::Error),
}

impl TopologyError {
    /// Create an invalid input error.
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput { field, reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = TopologyError::invalid_input("prefix", "must not be empty");
        assert_eq!(err.to_string(), "Invalid prefix: must not be empty");
    }

    #[test]
    fn test_duplicate_region_display() {
        let err = TopologyError::DuplicateRegion("us-west-2".to_string());
        assert!(err.to_string().contains("us-west-2"));
    }

    #[test]
    fn test_core_error_conversion() {
        let err = TopologyError::from(coffer_core::Error::InvalidPolicy("empty".to_string()));
        assert!(matches!(err, TopologyError::Core(_)));
        assert!(err.to_string().contains("empty"));
    }
}
