//! Error types shared across the memory layers

use thiserror::Error;

/// Memory layer error types
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Version conflict on {key}: expected {expected}, found {found:?}")]
    Conflict {
        key: String,
        expected: u64,
        found: Option<u64>,
    },

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Capability unavailable: {0}")]
    Unavailable(String),
}

impl From<anyhow::Error> for MemoryError {
    fn from(error: anyhow::Error) -> Self {
        MemoryError::Storage(format!("{error:#}"))
    }
}

/// Result type alias for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_becomes_storage_error() {
        let error: MemoryError = anyhow::anyhow!("disk full").into();
        assert!(matches!(error, MemoryError::Storage(ref msg) if msg == "disk full"));
    }

    #[test]
    fn test_conflict_display() {
        let error = MemoryError::Conflict {
            key: "profile:u1".to_string(),
            expected: 2,
            found: Some(3),
        };
        assert_eq!(
            error.to_string(),
            "Version conflict on profile:u1: expected 2, found Some(3)"
        );
    }
}
