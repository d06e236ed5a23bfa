//! Service layer for the ledger
//!
//! [`LedgerService`] is the surface transport adapters call. The concrete
//! stack is a [`ValidatingLedgerService`] wrapping a
//! [`DefaultLedgerService`]; [`open_service`] assembles it from settings.

pub mod enforcement;
pub mod import;
pub mod ledger;
pub mod validation;

pub use enforcement::ensure_budget_available;
pub use ledger::DefaultLedgerService;
pub use validation::ValidatingLedgerService;

use std::sync::Arc;

use tracing::info;

use crate::cache::{AggregateCache, MemoryCache, NoopCache};
use crate::cancel::CancelToken;
use crate::clock::{Clock, SystemClock};
use crate::config::{LedgerPaths, Settings, StorageBackend};
use crate::error::{ImportError, LedgerResult};
use crate::models::{
    AccountId, Budget, BudgetId, BudgetUpdate, NewBudget, NewReport, NewTransaction, Report,
    ReportId, ReportUpdate, Transaction, TransactionId, TransactionUpdate,
};
use crate::reports::ReportSummary;
use crate::storage::{LedgerStore, MemoryStore, Storage};

/// Ledger operations exposed to callers
///
/// Every operation takes the caller's [`CancelToken`]. Once it trips the
/// operation stops with `Cancelled`; a write that has not reached the store
/// is not committed.
pub trait LedgerService: Send + Sync {
    fn create_transaction(
        &self,
        cancel: &CancelToken,
        input: NewTransaction,
    ) -> LedgerResult<Transaction>;
    fn get_transaction(
        &self,
        cancel: &CancelToken,
        id: &TransactionId,
    ) -> LedgerResult<Transaction>;
    fn update_transaction(
        &self,
        cancel: &CancelToken,
        input: TransactionUpdate,
    ) -> LedgerResult<Transaction>;
    fn delete_transaction(&self, cancel: &CancelToken, id: &TransactionId) -> LedgerResult<()>;
    fn list_transactions(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Transaction>>;

    fn create_budget(&self, cancel: &CancelToken, input: NewBudget) -> LedgerResult<Budget>;
    fn get_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<Budget>;
    fn update_budget(&self, cancel: &CancelToken, input: BudgetUpdate) -> LedgerResult<Budget>;
    fn delete_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<()>;
    fn list_budgets(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Budget>>;

    fn create_report(&self, cancel: &CancelToken, input: NewReport) -> LedgerResult<Report>;
    fn get_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<Report>;
    fn update_report(&self, cancel: &CancelToken, input: ReportUpdate) -> LedgerResult<Report>;
    fn delete_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<()>;
    fn list_reports(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Report>>;

    /// Aggregate an arbitrary period without persisting a report
    fn report_summary(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        period: &str,
        currency: Option<&str>,
    ) -> LedgerResult<ReportSummary>;

    /// Create one transaction per CSV row, stopping at the first failure
    ///
    /// Rows committed before the failure stay committed; the error carries
    /// their count.
    fn import_transactions_csv(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        content: &[u8],
        has_header: bool,
    ) -> Result<usize, ImportError>;

    /// Serialize an account's transactions as CSV with a header row
    fn export_transactions_csv(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<u8>>;
}

/// Build the service stack described by `settings`
///
/// The caller owns logging setup; see [`crate::logging::init_tracing`].
pub fn open_service(
    paths: &LedgerPaths,
    settings: &Settings,
) -> LedgerResult<ValidatingLedgerService<DefaultLedgerService>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn LedgerStore> = match settings.storage_backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Json => Arc::new(Storage::open(paths.clone())?),
    };

    let cache: Arc<dyn AggregateCache> = if settings.cache.enabled {
        Arc::new(MemoryCache::new(settings.cache_ttl(), clock.clone()))
    } else {
        Arc::new(NoopCache)
    };

    info!(
        backend = ?settings.storage_backend,
        cache_enabled = settings.cache.enabled,
        ttl_seconds = settings.cache.ttl_seconds,
        "ledger service ready"
    );

    Ok(ValidatingLedgerService::new(DefaultLedgerService::new(
        store, cache, clock,
    )))
}
