//! `DocumentStorage` backends, one module per feature.

use dynablock_core::storage::{DocumentStorage, Result, StorageError};
use serde_json::Value;
use std::sync::Arc;

#[cfg(feature = "redb")]
pub mod redb;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redb")]
pub use redb::{RedbBackend, RedbBackendConfig};

#[cfg(feature = "memory")]
pub use memory::{MemoryBackend, MemoryBackendConfig};

/// Open the backend named by `backend_type` with a JSON config.
///
/// # Example
/// ```no_run
/// use dynablock_storage::create_backend;
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = json!({ "path": "./drawing.dynablock" });
/// let backend = create_backend("redb", &config)?;
/// # Ok(())
/// # }
/// ```
pub fn create_backend(backend_type: &str, config: &Value) -> Result<Arc<dyn DocumentStorage>> {
    match backend_type {
        #[cfg(feature = "redb")]
        "redb" => {
            let cfg: RedbBackendConfig = serde_json::from_value(config.clone()).map_err(|e| {
                StorageError::Configuration(format!("Invalid redb config: {}", e))
            })?;
            Ok(Arc::new(redb::RedbBackend::new(cfg)?))
        }

        #[cfg(feature = "memory")]
        "memory" => {
            let cfg: MemoryBackendConfig = serde_json::from_value(config.clone()).map_err(|e| {
                StorageError::Configuration(format!("Invalid memory config: {}", e))
            })?;
            Ok(Arc::new(memory::MemoryBackend::new(cfg)))
        }

        _ => Err(StorageError::Configuration(format!(
            "Unknown backend type: {}. Available backends: {}",
            backend_type,
            available_backends().join(", ")
        ))),
    }
}

/// Backend type tags compiled into this build.
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();
    #[cfg(feature = "redb")]
    backends.push("redb");
    #[cfg(feature = "memory")]
    backends.push("memory");
    backends
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_backend_unknown() {
        let result = create_backend("unknown", &serde_json::json!({}));
        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }

    #[cfg(feature = "memory")]
    #[test]
    fn test_create_memory_backend() {
        let backend = create_backend("memory", &serde_json::json!({})).unwrap();
        assert!(!backend.is_persistent());
    }

    #[cfg(feature = "redb")]
    #[test]
    fn test_create_redb_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.redb");
        let config = serde_json::json!({ "path": path.to_string_lossy() });
        let backend = create_backend("redb", &config).unwrap();
        assert!(backend.is_persistent());
    }

    #[cfg(feature = "redb")]
    #[test]
    fn test_create_redb_backend_bad_config() {
        let result = create_backend("redb", &serde_json::json!({ "cache_capacity": 4 }));
        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }
}
