//! Storage layer for the ledger
//!
//! [`LedgerStore`] is the seam between the ledger service and persistence.
//! Two implementations ship with the crate: [`MemoryStore`], an in-process
//! reference implementation, and [`Storage`], which keeps one JSON file per
//! entity with atomic writes.
//!
//! Budgets and reports are scoped by account: asking for one under the wrong
//! account is `NotFound`, exactly as if it did not exist.

pub mod budget;
pub mod file_io;
pub mod memory;
pub mod reports;
pub mod transactions;

pub use budget::BudgetRepository;
pub use file_io::{read_json, write_json_atomic};
pub use memory::MemoryStore;
pub use reports::ReportRepository;
pub use transactions::TransactionRepository;

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::config::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AccountId, Budget, BudgetId, Report, ReportId, Transaction, TransactionId,
};

/// Durable CRUD for transactions, budgets and reports
///
/// Implementations guard their own state and are shared across threads.
/// Creating an entity whose id already exists fails with `Duplicate`;
/// updating or deleting one that does not exist fails with `NotFound`.
pub trait LedgerStore: Send + Sync {
    fn create_transaction(
        &self,
        cancel: &CancelToken,
        txn: Transaction,
    ) -> LedgerResult<Transaction>;
    fn get_transaction(
        &self,
        cancel: &CancelToken,
        id: &TransactionId,
    ) -> LedgerResult<Transaction>;
    fn update_transaction(
        &self,
        cancel: &CancelToken,
        txn: Transaction,
    ) -> LedgerResult<Transaction>;
    fn delete_transaction(&self, cancel: &CancelToken, id: &TransactionId) -> LedgerResult<()>;
    /// All transactions of an account; an empty account id lists nothing
    fn list_transactions(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Transaction>>;

    fn create_budget(&self, cancel: &CancelToken, budget: Budget) -> LedgerResult<Budget>;
    fn get_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<Budget>;
    /// Replace a budget stored under the same account
    fn update_budget(&self, cancel: &CancelToken, budget: Budget) -> LedgerResult<Budget>;
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

    fn create_report(&self, cancel: &CancelToken, report: Report) -> LedgerResult<Report>;
    fn get_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<Report>;
    /// Replace a report stored under the same account
    fn update_report(&self, cancel: &CancelToken, report: Report) -> LedgerResult<Report>;
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
}

/// JSON-file store
///
/// Every write is saved immediately. When the save fails the in-memory
/// change is rolled back so memory and disk stay in step.
pub struct Storage {
    paths: LedgerPaths,
    transactions: TransactionRepository,
    budgets: BudgetRepository,
    reports: ReportRepository,
    /// Serializes writers so that existence checks and saves do not interleave
    write_lock: Mutex<()>,
}

impl Storage {
    /// Open the store under `paths`, creating directories and loading any
    /// existing data
    pub fn open(paths: LedgerPaths) -> LedgerResult<Self> {
        paths.ensure_directories()?;

        let storage = Self {
            transactions: TransactionRepository::new(paths.transactions_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            reports: ReportRepository::new(paths.reports_file()),
            paths,
            write_lock: Mutex::new(()),
        };
        storage.load_all()?;

        debug!(base_dir = %storage.paths.base_dir().display(), "opened JSON ledger store");
        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    /// Reload all data from disk
    pub fn load_all(&self) -> LedgerResult<()> {
        self.transactions.load()?;
        self.budgets.load()?;
        self.reports.load()?;
        Ok(())
    }

    fn lock_writes(&self) -> LedgerResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

/// Persist an in-memory change, or undo it
///
/// A tripped token skips the save. Either way a change that did not reach
/// disk is rolled back.
fn commit(
    cancel: &CancelToken,
    save: impl FnOnce() -> LedgerResult<()>,
    rollback: impl FnOnce(),
) -> LedgerResult<()> {
    if let Err(err) = cancel.check().and_then(|()| save()) {
        rollback();
        if err.is_cancelled() {
            debug!("write cancelled before save, in-memory change rolled back");
        } else {
            warn!(error = %err, "save failed, in-memory change rolled back");
        }
        return Err(err);
    }
    Ok(())
}

impl LedgerStore for Storage {
    fn create_transaction(
        &self,
        cancel: &CancelToken,
        txn: Transaction,
    ) -> LedgerResult<Transaction> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        if self.transactions.get(&txn.id)?.is_some() {
            return Err(LedgerError::Duplicate {
                entity_type: "Transaction",
                identifier: txn.id.to_string(),
            });
        }

        self.transactions.upsert(txn.clone())?;
        commit(cancel, || self.transactions.save(), || {
            let _ = self.transactions.delete(&txn.id);
        })?;
        Ok(txn)
    }

    fn get_transaction(
        &self,
        cancel: &CancelToken,
        id: &TransactionId,
    ) -> LedgerResult<Transaction> {
        cancel.check()?;
        self.transactions
            .get(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.as_str()))
    }

    fn update_transaction(
        &self,
        cancel: &CancelToken,
        txn: Transaction,
    ) -> LedgerResult<Transaction> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        let previous = self
            .transactions
            .get(&txn.id)?
            .ok_or_else(|| LedgerError::transaction_not_found(txn.id.as_str()))?;

        self.transactions.upsert(txn.clone())?;
        commit(cancel, || self.transactions.save(), || {
            let _ = self.transactions.upsert(previous);
        })?;
        Ok(txn)
    }

    fn delete_transaction(&self, cancel: &CancelToken, id: &TransactionId) -> LedgerResult<()> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        let removed = self
            .transactions
            .delete(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.as_str()))?;

        commit(cancel, || self.transactions.save(), || {
            let _ = self.transactions.upsert(removed);
        })
    }

    fn list_transactions(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Transaction>> {
        cancel.check()?;
        if account_id.is_empty() {
            return Ok(Vec::new());
        }
        self.transactions.get_by_account(account_id)
    }

    fn create_budget(&self, cancel: &CancelToken, budget: Budget) -> LedgerResult<Budget> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        if self.budgets.get(&budget.id)?.is_some() {
            return Err(LedgerError::Duplicate {
                entity_type: "Budget",
                identifier: budget.id.to_string(),
            });
        }

        self.budgets.upsert(budget.clone())?;
        commit(cancel, || self.budgets.save(), || {
            let _ = self.budgets.delete(&budget.id);
        })?;
        Ok(budget)
    }

    fn get_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<Budget> {
        cancel.check()?;
        self.budgets
            .get(id)?
            .filter(|b| &b.account_id == account_id)
            .ok_or_else(|| LedgerError::budget_not_found(id.as_str()))
    }

    fn update_budget(&self, cancel: &CancelToken, budget: Budget) -> LedgerResult<Budget> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        let previous = self.get_budget(cancel, &budget.account_id, &budget.id)?;

        self.budgets.upsert(budget.clone())?;
        commit(cancel, || self.budgets.save(), || {
            let _ = self.budgets.upsert(previous);
        })?;
        Ok(budget)
    }

    fn delete_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<()> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        self.get_budget(cancel, account_id, id)?;

        let removed = self
            .budgets
            .delete(id)?
            .ok_or_else(|| LedgerError::budget_not_found(id.as_str()))?;
        commit(cancel, || self.budgets.save(), || {
            let _ = self.budgets.upsert(removed);
        })
    }

    fn list_budgets(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Budget>> {
        cancel.check()?;
        if account_id.is_empty() {
            return Ok(Vec::new());
        }
        self.budgets.get_by_account(account_id)
    }

    fn create_report(&self, cancel: &CancelToken, report: Report) -> LedgerResult<Report> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        if self.reports.get(&report.id)?.is_some() {
            return Err(LedgerError::Duplicate {
                entity_type: "Report",
                identifier: report.id.to_string(),
            });
        }

        self.reports.upsert(report.clone())?;
        commit(cancel, || self.reports.save(), || {
            let _ = self.reports.delete(&report.id);
        })?;
        Ok(report)
    }

    fn get_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<Report> {
        cancel.check()?;
        self.reports
            .get(id)?
            .filter(|r| &r.account_id == account_id)
            .ok_or_else(|| LedgerError::report_not_found(id.as_str()))
    }

    fn update_report(&self, cancel: &CancelToken, report: Report) -> LedgerResult<Report> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        let previous = self.get_report(cancel, &report.account_id, &report.id)?;

        self.reports.upsert(report.clone())?;
        commit(cancel, || self.reports.save(), || {
            let _ = self.reports.upsert(previous);
        })?;
        Ok(report)
    }

    fn delete_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<()> {
        cancel.check()?;
        let _guard = self.lock_writes()?;
        self.get_report(cancel, account_id, id)?;

        let removed = self
            .reports
            .delete(id)?
            .ok_or_else(|| LedgerError::report_not_found(id.as_str()))?;
        commit(cancel, || self.reports.save(), || {
            let _ = self.reports.upsert(removed);
        })
    }

    fn list_reports(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Report>> {
        cancel.check()?;
        if account_id.is_empty() {
            return Ok(Vec::new());
        }
        self.reports.get_by_account(account_id)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, storage) = create_test_storage();
        assert!(temp_dir.path().join("data").exists());
        assert_eq!(storage.paths().base_dir(), temp_dir.path());
    }

    #[test]
    fn test_storage_transactions() {
        let (_temp_dir, storage) = create_test_storage();
        conformance::check_transactions(&storage);
    }

    #[test]
    fn test_storage_budgets() {
        let (_temp_dir, storage) = create_test_storage();
        conformance::check_budgets(&storage);
    }

    #[test]
    fn test_storage_reports() {
        let (_temp_dir, storage) = create_test_storage();
        conformance::check_reports(&storage);
    }

    #[test]
    fn test_data_survives_reopen() {
        let cancel = CancelToken::none();
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        {
            let storage = Storage::open(paths.clone()).unwrap();
            storage
                .create_transaction(cancel, conformance::transaction("t-1", "acc-1"))
                .unwrap();
            storage.create_budget(cancel, conformance::budget("b-1", "acc-1")).unwrap();
            storage.create_report(cancel, conformance::report("rep-1", "acc-1")).unwrap();
        }

        let reopened = Storage::open(paths).unwrap();
        let acc = AccountId::from("acc-1");
        assert_eq!(reopened.list_transactions(cancel, &acc).unwrap().len(), 1);
        assert_eq!(reopened.list_budgets(cancel, &acc).unwrap().len(), 1);
        assert_eq!(reopened.list_reports(cancel, &acc).unwrap().len(), 1);
    }

    #[test]
    fn test_storage_cancelled() {
        let (_temp_dir, storage) = create_test_storage();
        conformance::check_cancelled(&storage);
    }

    #[test]
    fn test_expired_deadline_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        {
            let storage = Storage::open(paths.clone()).unwrap();
            let expired = CancelToken::with_timeout(std::time::Duration::ZERO);
            let err = storage
                .create_transaction(&expired, conformance::transaction("t-1", "acc-1"))
                .unwrap_err();
            assert!(err.is_cancelled());
        }

        assert!(!paths.transactions_file().exists());
        let reopened = Storage::open(paths).unwrap();
        assert!(reopened
            .list_transactions(CancelToken::none(), &AccountId::from("acc-1"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_commit_skips_save_once_cancelled() {
        let cancelled = CancelToken::new();
        cancelled.cancel();
        let mut saved = false;
        let mut rolled_back = false;
        let err = commit(
            &cancelled,
            || {
                saved = true;
                Ok(())
            },
            || rolled_back = true,
        )
        .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!saved);
        assert!(rolled_back);

        let mut rolled_back = false;
        commit(CancelToken::none(), || Ok(()), || rolled_back = true).unwrap();
        assert!(!rolled_back);

        let err = commit(
            CancelToken::none(),
            || Err(LedgerError::Storage("disk full".into())),
            || rolled_back = true,
        )
        .unwrap_err();
        assert!(err.is_internal());
        assert!(rolled_back);
    }
}
