//! ledger-core - personal-finance ledger engine
//!
//! This library records transactions, enforces per-category monthly budgets
//! at write time, and computes income/expense reports whose budgets are
//! prorated across arbitrary periods. Derived views are kept in a TTL cache
//! that every write invalidates.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `cancel`: Cancellation tokens passed to every operation
//! - `config`: Data directory resolution and settings
//! - `error`: Custom error types
//! - `models`: Core data models (transactions, budgets, reports, periods)
//! - `storage`: The store trait with in-memory and JSON file implementations
//! - `cache`: The aggregate cache trait with TTL and no-op implementations
//! - `reports`: Report aggregation and budget proration
//! - `services`: Ledger facade, validation layer and budget enforcement
//! - `export`: CSV export of transactions
//!
//! # Example
//!
//! ```rust,ignore
//! use ledger_core::config::{LedgerPaths, Settings};
//! use ledger_core::services::{open_service, LedgerService};
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ledger_core::logging::init_tracing(&settings.log_filter);
//! let ledger = open_service(&paths, &settings)?;
//! ```

pub mod cache;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use cancel::CancelToken;
pub use error::{ImportError, LedgerError, LedgerResult};
pub use services::{open_service, LedgerService};
