//! In-memory ledger store
//!
//! Reference implementation of [`LedgerStore`] backed by maps behind one
//! `RwLock`. Used in tests and when the `memory` backend is configured.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cancel::CancelToken;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AccountId, Budget, BudgetId, Report, ReportId, Transaction, TransactionId,
};

use super::budget::sort_budgets;
use super::reports::sort_reports;
use super::transactions::sort_transactions;
use super::LedgerStore;

#[derive(Default)]
struct MemoryState {
    transactions: HashMap<TransactionId, Transaction>,
    budgets: HashMap<BudgetId, Budget>,
    reports: HashMap<ReportId, Report>,
}

/// Map-backed store
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    /// Take the write lock, giving up if the token tripped while waiting
    fn write(&self, cancel: &CancelToken) -> LedgerResult<RwLockWriteGuard<'_, MemoryState>> {
        cancel.check()?;
        let state = self
            .state
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        cancel.check()?;
        Ok(state)
    }
}

impl LedgerStore for MemoryStore {
    fn create_transaction(
        &self,
        cancel: &CancelToken,
        txn: Transaction,
    ) -> LedgerResult<Transaction> {
        let mut state = self.write(cancel)?;
        if state.transactions.contains_key(&txn.id) {
            return Err(LedgerError::Duplicate {
                entity_type: "Transaction",
                identifier: txn.id.to_string(),
            });
        }
        state.transactions.insert(txn.id.clone(), txn.clone());
        Ok(txn)
    }

    fn get_transaction(
        &self,
        cancel: &CancelToken,
        id: &TransactionId,
    ) -> LedgerResult<Transaction> {
        cancel.check()?;
        self.read()?
            .transactions
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::transaction_not_found(id.as_str()))
    }

    fn update_transaction(
        &self,
        cancel: &CancelToken,
        txn: Transaction,
    ) -> LedgerResult<Transaction> {
        let mut state = self.write(cancel)?;
        match state.transactions.get_mut(&txn.id) {
            Some(slot) => {
                *slot = txn.clone();
                Ok(txn)
            }
            None => Err(LedgerError::transaction_not_found(txn.id.as_str())),
        }
    }

    fn delete_transaction(&self, cancel: &CancelToken, id: &TransactionId) -> LedgerResult<()> {
        self.write(cancel)?
            .transactions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::transaction_not_found(id.as_str()))
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
        let state = self.read()?;
        let mut list: Vec<_> = state
            .transactions
            .values()
            .filter(|t| &t.account_id == account_id)
            .cloned()
            .collect();
        sort_transactions(&mut list);
        Ok(list)
    }

    fn create_budget(&self, cancel: &CancelToken, budget: Budget) -> LedgerResult<Budget> {
        let mut state = self.write(cancel)?;
        if state.budgets.contains_key(&budget.id) {
            return Err(LedgerError::Duplicate {
                entity_type: "Budget",
                identifier: budget.id.to_string(),
            });
        }
        state.budgets.insert(budget.id.clone(), budget.clone());
        Ok(budget)
    }

    fn get_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<Budget> {
        cancel.check()?;
        self.read()?
            .budgets
            .get(id)
            .filter(|b| &b.account_id == account_id)
            .cloned()
            .ok_or_else(|| LedgerError::budget_not_found(id.as_str()))
    }

    fn update_budget(&self, cancel: &CancelToken, budget: Budget) -> LedgerResult<Budget> {
        let mut state = self.write(cancel)?;
        match state.budgets.get_mut(&budget.id) {
            Some(slot) if slot.account_id == budget.account_id => {
                *slot = budget.clone();
                Ok(budget)
            }
            _ => Err(LedgerError::budget_not_found(budget.id.as_str())),
        }
    }

    fn delete_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<()> {
        let mut state = self.write(cancel)?;
        let owned = state
            .budgets
            .get(id)
            .is_some_and(|b| &b.account_id == account_id);
        if !owned {
            return Err(LedgerError::budget_not_found(id.as_str()));
        }
        state.budgets.remove(id);
        Ok(())
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
        let state = self.read()?;
        let mut list: Vec<_> = state
            .budgets
            .values()
            .filter(|b| &b.account_id == account_id)
            .cloned()
            .collect();
        sort_budgets(&mut list);
        Ok(list)
    }

    fn create_report(&self, cancel: &CancelToken, report: Report) -> LedgerResult<Report> {
        let mut state = self.write(cancel)?;
        if state.reports.contains_key(&report.id) {
            return Err(LedgerError::Duplicate {
                entity_type: "Report",
                identifier: report.id.to_string(),
            });
        }
        state.reports.insert(report.id.clone(), report.clone());
        Ok(report)
    }

    fn get_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<Report> {
        cancel.check()?;
        self.read()?
            .reports
            .get(id)
            .filter(|r| &r.account_id == account_id)
            .cloned()
            .ok_or_else(|| LedgerError::report_not_found(id.as_str()))
    }

    fn update_report(&self, cancel: &CancelToken, report: Report) -> LedgerResult<Report> {
        let mut state = self.write(cancel)?;
        match state.reports.get_mut(&report.id) {
            Some(slot) if slot.account_id == report.account_id => {
                *slot = report.clone();
                Ok(report)
            }
            _ => Err(LedgerError::report_not_found(report.id.as_str())),
        }
    }

    fn delete_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<()> {
        let mut state = self.write(cancel)?;
        let owned = state
            .reports
            .get(id)
            .is_some_and(|r| &r.account_id == account_id);
        if !owned {
            return Err(LedgerError::report_not_found(id.as_str()));
        }
        state.reports.remove(id);
        Ok(())
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
        let state = self.read()?;
        let mut list: Vec<_> = state
            .reports
            .values()
            .filter(|r| &r.account_id == account_id)
            .cloned()
            .collect();
        sort_reports(&mut list);
        Ok(list)
    }
}
