//! Ledger settings
//!
//! Chooses the store backend, the aggregate cache behaviour and the default
//! log filter. Every field has a serde default so older files keep loading.

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::logging::DEFAULT_LOG_FILTER;
use crate::storage::write_json_atomic;

/// Which store backs the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process maps; data is lost on exit
    Memory,
    /// JSON files under the data directory
    #[default]
    Json,
}

/// Aggregate cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether derived views are cached at all
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

/// Settings for an embedded ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Store backend
    #[serde(default)]
    pub storage_backend: StorageBackend,

    /// Aggregate cache behaviour
    #[serde(default)]
    pub cache: CacheSettings,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_cache_enabled() -> bool {
    true
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            storage_backend: StorageBackend::default(),
            cache: CacheSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Cache entry lifetime, capped at `u32::MAX` seconds
    pub fn cache_ttl(&self) -> chrono::Duration {
        let seconds = self.cache.ttl_seconds.min(u64::from(u32::MAX));
        chrono::Duration::seconds(seconds as i64)
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> LedgerResult<Self> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk, replacing `config.json` atomically
    pub fn save(&self, paths: &LedgerPaths) -> LedgerResult<()> {
        paths.ensure_directories()?;

        write_json_atomic(paths.settings_file(), self)
    }
}
