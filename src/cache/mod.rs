//! Aggregate cache
//!
//! A disposable projection of derived views: reports by id, live summaries
//! by `(account, period, currency)`, and budget lists by account. Losing the
//! cache never loses data. The ledger service treats every [`CacheError`]
//! as a miss and falls back to the store.

pub mod memory;
pub mod noop;

pub use memory::MemoryCache;
pub use noop::NoopCache;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::models::{AccountId, Budget, Report, ReportId};
use crate::reports::ReportSummary;

/// Cache failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// No live entry for the key
    #[error("cache miss")]
    Miss,

    /// The caller's cancel token tripped
    #[error("cache call cancelled")]
    Cancelled,

    /// The cache backend itself failed
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Check if this is an ordinary miss rather than a failure
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// Check if the caller gave up rather than the cache failing
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// `Err(Cancelled)` once `cancel` has tripped
    pub fn check(cancel: &CancelToken) -> CacheResult<()> {
        if cancel.is_cancelled() {
            Err(Self::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Key of a cached live summary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryKey {
    pub account_id: AccountId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Currency filter; `None` when the summary resolves its own currency
    pub currency: Option<String>,
}

/// Key-value cache for derived ledger views
///
/// Every call gives up with [`CacheError::Cancelled`] once its token trips.
pub trait AggregateCache: Send + Sync {
    fn get_report(&self, cancel: &CancelToken, id: &ReportId) -> CacheResult<Report>;
    fn set_report(&self, cancel: &CancelToken, report: &Report) -> CacheResult<()>;
    fn delete_report(&self, cancel: &CancelToken, id: &ReportId) -> CacheResult<()>;

    fn get_summary(&self, cancel: &CancelToken, key: &SummaryKey) -> CacheResult<ReportSummary>;
    fn set_summary(
        &self,
        cancel: &CancelToken,
        key: &SummaryKey,
        summary: &ReportSummary,
    ) -> CacheResult<()>;
    /// Drop every cached summary of an account
    fn delete_summaries(&self, cancel: &CancelToken, account_id: &AccountId) -> CacheResult<()>;

    fn get_budget_list(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> CacheResult<Vec<Budget>>;
    fn set_budget_list(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        budgets: &[Budget],
    ) -> CacheResult<()>;
    fn delete_budget_list(&self, cancel: &CancelToken, account_id: &AccountId) -> CacheResult<()>;
}
