//! Configuration module for the ledger
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence (store backend, cache TTL, log filter)

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::{CacheSettings, Settings, StorageBackend};
