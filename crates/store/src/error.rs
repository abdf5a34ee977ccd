use thiserror::Error;
use uuid::Uuid;

use crate::Version;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The expected version did not match the persisted version.
    #[error("Version conflict for {kind} {id}: expected {expected}, found {actual}")]
    VersionConflict {
        kind: String,
        id: Uuid,
        expected: Version,
        actual: Version,
    },

    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: Uuid },

    /// Another record of the same kind already holds this unique value.
    #[error("Duplicate {kind} {field}: {value}")]
    DuplicateKey {
        kind: String,
        field: String,
        value: String,
    },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
