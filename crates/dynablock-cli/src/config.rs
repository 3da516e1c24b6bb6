//! CLI configuration.
//!
//! Resolution order: `--store` flag > config file > `DYNABLOCK_STORE` > defaults.
//! The config file is the `--config` path, or `dynablock.toml` in the working
//! directory when present.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use dynablock_core::config::env_vars;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dynablock.toml";
/// Store file used when nothing else names one.
pub const DEFAULT_STORE_FILE: &str = "drawing.dynablock";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Backend type tag, see `dynablock_storage::available_backends`.
    pub backend: String,
    pub path: Option<PathBuf>,
    pub cache_capacity: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "redb".to_string(),
            path: None,
            cache_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: Option<bool>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl CliConfig {
    /// Parse a TOML config.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config file")
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("In {}", path.display()))
    }

    /// Resolve the effective configuration.
    pub fn resolve(config_path: Option<&Path>, store_override: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(path) = store_override {
            config.storage.path = Some(path);
        } else if config.storage.path.is_none() {
            config.storage.path = std::env::var_os(env_vars::STORE_PATH).map(PathBuf::from);
        }
        Ok(config)
    }

    pub fn store_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE))
    }

    /// JSON config handed to `create_backend`.
    pub fn backend_config(&self) -> serde_json::Value {
        json!({
            "path": self.store_path().to_string_lossy(),
            "cache_capacity": self.storage.cache_capacity,
        })
    }

    /// Whether to log as JSON; `DYNABLOCK_LOG_JSON` wins over the file.
    pub fn json_logging(&self) -> bool {
        std::env::var(env_vars::LOG_JSON)
            .ok()
            .and_then(|v| v.parse().ok())
            .or(self.logging.json)
            .unwrap_or(false)
    }
}
