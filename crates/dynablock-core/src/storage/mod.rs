//! Document string storage abstraction.
//!
//! The host document exposes a namespaced key-value string table. The
//! registry keeps its whole state as one blob under a single `(section, key)`
//! pair of that table.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes are not valid text.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend error.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Other error.
    #[error("Storage error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Document-scoped string storage.
///
/// Implementations replace a value in full on `set`; there is no merge.
pub trait DocumentStorage: Send + Sync {
    /// Read the string stored under `(section, key)`.
    fn get(&self, section: &str, key: &str) -> Result<Option<String>>;

    /// Store `value` under `(section, key)`, replacing any previous value.
    fn set(&self, section: &str, key: &str, value: &str) -> Result<()>;

    /// Check if this storage survives process restarts.
    fn is_persistent(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::Configuration("missing path".to_string());
        assert!(err.to_string().contains("missing path"));
    }
}
