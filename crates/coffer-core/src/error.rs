//! Error types for Coffer core.

use thiserror::Error;

use crate::replication::ReplicationConfigError;

/// A specialized `Result` type for Coffer core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading configuration or handling documents.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A policy document is structurally invalid.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// A replication configuration is inconsistent.
    #[error("invalid replication configuration: {0}")]
    InvalidReplication(#[from] ReplicationConfigError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("missing prefix".to_string());
        assert_eq!(err.to_string(), "configuration error: missing prefix");

        let err = Error::InvalidPolicy("no statements".to_string());
        assert!(err.to_string().contains("no statements"));
    }

    #[test]
    fn test_from_replication_error() {
        let err = Error::from(ReplicationConfigError::DuplicatePriority(1));
        assert!(matches!(
            err,
            Error::InvalidReplication(ReplicationConfigError::DuplicatePriority(1))
        ));
        assert_eq!(
            err.to_string(),
            "invalid replication configuration: Duplicate rule priority: 1"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::from(parse_err);
        assert!(matches!(err, Error::Serialization(_)));
    }
}
