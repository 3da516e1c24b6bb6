//! Document strings in a redb file, one row per `section:key` pair.

use dynablock_core::storage::{DocumentStorage, Result, StorageError};
use lru::LruCache;
use parking_lot::Mutex;
use redb::{Database, ReadableTable, TableDefinition};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

// Single table for all sections; keys are "section:key".
const STRINGS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("document_strings");

const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Where and how to open the redb file.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct RedbBackendConfig {
    /// Database file, or `:memory:`.
    pub path: String,

    /// Create missing parent directories on open.
    #[serde(default = "default_create_dirs")]
    pub create_dirs: bool,

    /// LRU cache capacity (number of entries). 0 disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_create_dirs() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl RedbBackendConfig {
    /// Config for the file at `path`, other settings at their defaults.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            create_dirs: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Config for a scratch database that is removed on drop.
    pub fn memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            create_dirs: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

fn make_key(section: &str, key: &str) -> String {
    let mut result = String::with_capacity(section.len() + key.len() + 1);
    result.push_str(section);
    result.push(':');
    result.push_str(key);
    result
}

fn backend_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(e.to_string())
}

/// redb-based document string storage with an optional read cache.
pub struct RedbBackend {
    db: Database,
    temp_path: Option<PathBuf>,
    cache: Option<Mutex<LruCache<String, String>>>,
}

impl RedbBackend {
    /// Open the file named in `config`; `:memory:` uses a throwaway temp file.
    pub fn new(config: RedbBackendConfig) -> Result<Self> {
        let (db, temp_path) = if config.path == ":memory:" {
            // redb has no in-memory mode; use a throwaway file.
            let temp_path =
                std::env::temp_dir().join(format!("dynablock_{}.redb", uuid::Uuid::new_v4()));
            let db = Database::create(&temp_path).map_err(backend_err)?;
            (db, Some(temp_path))
        } else {
            let path_ref = Path::new(&config.path);
            if config.create_dirs {
                if let Some(parent) = path_ref.parent() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            // `create` opens an existing file without truncating it.
            let db = Database::create(path_ref).map_err(backend_err)?;
            (db, None)
        };

        let cache = NonZeroUsize::new(config.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));

        tracing::debug!(path = %config.path, "Opened redb document storage");
        Ok(Self {
            db,
            temp_path,
            cache,
        })
    }

    /// Open `path` with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(RedbBackendConfig::new(
            path.as_ref().to_string_lossy().to_string(),
        ))
    }
}

impl DocumentStorage for RedbBackend {
    fn get(&self, section: &str, key: &str) -> Result<Option<String>> {
        let namespaced = make_key(section, key);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lock().get(&namespaced) {
                return Ok(Some(hit.clone()));
            }
        }

        let txn = self.db.begin_read().map_err(backend_err)?;
        let table = match txn.open_table(STRINGS_TABLE) {
            Ok(table) => table,
            // Nothing has been written yet.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(backend_err(e)),
        };

        let value = table
            .get(namespaced.as_str())
            .map_err(backend_err)?
            .map(|v| v.value().to_string());

        if let (Some(cache), Some(value)) = (&self.cache, &value) {
            cache.lock().put(namespaced, value.clone());
        }
        Ok(value)
    }

    fn set(&self, section: &str, key: &str, value: &str) -> Result<()> {
        let namespaced = make_key(section, key);

        let txn = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = txn.open_table(STRINGS_TABLE).map_err(backend_err)?;
            table
                .insert(namespaced.as_str(), value)
                .map_err(backend_err)?;
        }
        txn.commit().map_err(backend_err)?;

        // Write-through after the commit succeeded.
        if let Some(cache) = &self.cache {
            cache.lock().put(namespaced, value.to_string());
        }
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        self.temp_path.is_none()
    }
}

impl Drop for RedbBackend {
    fn drop(&mut self) {
        if let Some(temp_path) = &self.temp_path {
            if let Err(e) = std::fs::remove_file(temp_path) {
                tracing::debug!(path = %temp_path.display(), error = %e, "Scratch database not removed");
            }
        }
    }
}
