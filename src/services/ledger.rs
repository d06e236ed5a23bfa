//! Ledger service
//!
//! Orchestrates the store, the aggregate cache and the budget rules. Every
//! transaction or budget write invalidates the account's cached views after
//! it is persisted; reads check the cache first and fall back to the store.
//! Cache failures are logged and never reach the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{AggregateCache, CacheError, NoopCache, SummaryKey};
use crate::cancel::CancelToken;
use crate::clock::Clock;
use crate::error::{ImportError, LedgerError, LedgerResult};
use crate::export;
use crate::models::{
    AccountId, Budget, BudgetId, BudgetUpdate, NewBudget, NewReport, NewTransaction, Report,
    ReportId, ReportPeriod, ReportUpdate, Transaction, TransactionId, TransactionUpdate,
};
use crate::reports::{build_summary, ReportSummary};
use crate::storage::LedgerStore;

use super::enforcement::ensure_budget_available;
use super::import::{parse_record, read_records};
use super::LedgerService;

/// The ledger facade over a store, a cache and a clock
pub struct DefaultLedgerService {
    store: Arc<dyn LedgerStore>,
    cache: Arc<dyn AggregateCache>,
    clock: Arc<dyn Clock>,
}

impl DefaultLedgerService {
    /// Create a service from its collaborators
    pub fn new(
        store: Arc<dyn LedgerStore>,
        cache: Arc<dyn AggregateCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
        }
    }

    /// Create a service that always reads through to the store
    pub fn without_cache(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(store, Arc::new(NoopCache), clock)
    }

    /// Budgets of an account, cache-aside
    fn budgets_for(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Budget>> {
        if account_id.is_empty() {
            return Ok(Vec::new());
        }

        match self.cache.get_budget_list(cancel, account_id) {
            Ok(budgets) => {
                debug!(account = %account_id, "budget list cache hit");
                return Ok(budgets);
            }
            Err(err) => lookup_failed("budget list", account_id, &err),
        }

        cancel.check()?;
        let budgets = self.store.list_budgets(cancel, account_id)?;
        if let Err(err) = self.cache.set_budget_list(cancel, account_id, &budgets) {
            write_failed("budget list", account_id, &err);
        }
        Ok(budgets)
    }

    fn enforce_budgets(&self, cancel: &CancelToken, txn: &Transaction) -> LedgerResult<()> {
        if !txn.is_expense() {
            return Ok(());
        }

        let budgets = self.budgets_for(cancel, &txn.account_id)?;
        if !budgets.iter().any(|b| b.matches(txn)) {
            return Ok(());
        }

        let existing = self.store.list_transactions(cancel, &txn.account_id)?;
        ensure_budget_available(txn, &budgets, &existing)
    }

    /// Drop every cached view derived from the account's data
    ///
    /// Runs after a committed write, so it ignores the caller's token.
    fn invalidate_account(&self, account_id: &AccountId) {
        let cancel = CancelToken::none();
        if let Err(err) = self.cache.delete_budget_list(cancel, account_id) {
            write_failed("budget list", account_id, &err);
        }
        if let Err(err) = self.cache.delete_summaries(cancel, account_id) {
            write_failed("summary", account_id, &err);
        }

        match self.store.list_reports(cancel, account_id) {
            Ok(reports) => {
                for report in reports {
                    if let Err(err) = self.cache.delete_report(cancel, &report.id) {
                        write_failed("report", account_id, &err);
                    }
                }
            }
            Err(err) => {
                warn!(account = %account_id, error = %err, "could not list reports to invalidate");
            }
        }
    }

    fn cache_report(&self, cancel: &CancelToken, report: &Report) {
        if let Err(err) = self.cache.set_report(cancel, report) {
            write_failed("report", &report.account_id, &err);
        }
    }

    fn summarize(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        period: &ReportPeriod,
        currency: Option<&str>,
    ) -> LedgerResult<ReportSummary> {
        let transactions = self.store.list_transactions(cancel, account_id)?;
        let budgets = self.budgets_for(cancel, account_id)?;
        Ok(build_summary(&transactions, &budgets, period, currency))
    }

    /// Compute a report's figures from the account's current data
    ///
    /// `generated_at` is now; callers that keep another instant override it.
    fn compose_report(
        &self,
        cancel: &CancelToken,
        id: ReportId,
        account_id: &AccountId,
        name: String,
        period: &str,
        currency: Option<&str>,
    ) -> LedgerResult<Report> {
        let currency = currency.map(str::trim).filter(|c| !c.is_empty());
        let parsed = ReportPeriod::parse(period)?;
        let summary = self.summarize(cancel, account_id, &parsed, currency)?;

        Ok(Report {
            id,
            account_id: account_id.clone(),
            name,
            period: period.trim().to_string(),
            generated_at: self.clock.now(),
            currency: summary.currency,
            currency_filter: currency.map(str::to_string),
            total_income: summary.total_income,
            total_expense: summary.total_expense,
            categories: summary.categories,
        })
    }
}

fn lookup_failed(view: &'static str, account_id: &AccountId, err: &CacheError) {
    match err {
        CacheError::Miss => debug!(account = %account_id, view, "cache miss"),
        CacheError::Cancelled => debug!(account = %account_id, view, "cache read cancelled"),
        CacheError::Backend(_) => {
            warn!(account = %account_id, view, error = %err, "cache read failed, using store");
        }
    }
}

fn write_failed(view: &'static str, account_id: &AccountId, err: &CacheError) {
    if err.is_cancelled() {
        debug!(account = %account_id, view, "cache write cancelled");
    } else {
        warn!(account = %account_id, view, error = %err, "cache write failed");
    }
}

impl LedgerService for DefaultLedgerService {
    fn create_transaction(
        &self,
        cancel: &CancelToken,
        input: NewTransaction,
    ) -> LedgerResult<Transaction> {
        cancel.check()?;
        let now = self.clock.now();
        let txn = Transaction {
            id: input
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(TransactionId::generate),
            account_id: input.account_id,
            amount: input.amount,
            currency: input.currency,
            category: input.category,
            description: input.description,
            occurred_at: input.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };

        self.enforce_budgets(cancel, &txn)?;
        let created = self.store.create_transaction(cancel, txn)?;
        self.invalidate_account(&created.account_id);

        debug!(transaction = %created.id, account = %created.account_id, "created transaction");
        Ok(created)
    }

    fn get_transaction(
        &self,
        cancel: &CancelToken,
        id: &TransactionId,
    ) -> LedgerResult<Transaction> {
        self.store.get_transaction(cancel, id)
    }

    fn update_transaction(
        &self,
        cancel: &CancelToken,
        input: TransactionUpdate,
    ) -> LedgerResult<Transaction> {
        cancel.check()?;
        let current = self.store.get_transaction(cancel, &input.id)?;
        if current.account_id != input.account_id {
            return Err(LedgerError::transaction_not_found(input.id.as_str()));
        }

        let txn = Transaction {
            id: current.id,
            account_id: current.account_id,
            amount: input.amount,
            currency: input.currency,
            category: input.category,
            description: input.description,
            occurred_at: input.occurred_at.unwrap_or(current.occurred_at),
            created_at: current.created_at,
            updated_at: self.clock.now(),
        };

        self.enforce_budgets(cancel, &txn)?;
        let updated = self.store.update_transaction(cancel, txn)?;
        self.invalidate_account(&updated.account_id);

        debug!(transaction = %updated.id, account = %updated.account_id, "updated transaction");
        Ok(updated)
    }

    fn delete_transaction(&self, cancel: &CancelToken, id: &TransactionId) -> LedgerResult<()> {
        cancel.check()?;
        let current = self.store.get_transaction(cancel, id)?;
        self.store.delete_transaction(cancel, id)?;
        self.invalidate_account(&current.account_id);

        debug!(transaction = %id, account = %current.account_id, "deleted transaction");
        Ok(())
    }

    fn list_transactions(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Transaction>> {
        self.store.list_transactions(cancel, account_id)
    }

    fn create_budget(&self, cancel: &CancelToken, input: NewBudget) -> LedgerResult<Budget> {
        cancel.check()?;
        let now = self.clock.now();
        let budget = Budget {
            id: input
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(BudgetId::generate),
            account_id: input.account_id,
            name: input.name,
            amount: input.amount,
            currency: input.currency,
            cadence: input.cadence,
            month: input.month,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create_budget(cancel, budget)?;
        self.invalidate_account(&created.account_id);

        debug!(budget = %created.id, account = %created.account_id, "created budget");
        Ok(created)
    }

    fn get_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<Budget> {
        self.store.get_budget(cancel, account_id, id)
    }

    fn update_budget(&self, cancel: &CancelToken, input: BudgetUpdate) -> LedgerResult<Budget> {
        cancel.check()?;
        let current = self.store.get_budget(cancel, &input.account_id, &input.id)?;
        let budget = Budget {
            id: current.id,
            account_id: current.account_id,
            name: input.name,
            amount: input.amount,
            currency: input.currency,
            cadence: input.cadence,
            month: input.month.unwrap_or(current.month),
            created_at: current.created_at,
            updated_at: self.clock.now(),
        };

        let updated = self.store.update_budget(cancel, budget)?;
        self.invalidate_account(&updated.account_id);

        debug!(budget = %updated.id, account = %updated.account_id, "updated budget");
        Ok(updated)
    }

    fn delete_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<()> {
        cancel.check()?;
        self.store.delete_budget(cancel, account_id, id)?;
        self.invalidate_account(account_id);

        debug!(budget = %id, account = %account_id, "deleted budget");
        Ok(())
    }

    fn list_budgets(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Budget>> {
        cancel.check()?;
        self.budgets_for(cancel, account_id)
    }

    fn create_report(&self, cancel: &CancelToken, input: NewReport) -> LedgerResult<Report> {
        cancel.check()?;
        let id = input
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(ReportId::generate);

        let mut report = self.compose_report(
            cancel,
            id,
            &input.account_id,
            input.name,
            &input.period,
            input.currency.as_deref(),
        )?;
        if let Some(generated_at) = input.generated_at {
            report.generated_at = generated_at;
        }
        let created = self.store.create_report(cancel, report)?;
        self.cache_report(cancel, &created);

        debug!(report = %created.id, account = %created.account_id, period = %created.period, "created report");
        Ok(created)
    }

    fn get_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<Report> {
        cancel.check()?;
        match self.cache.get_report(cancel, id) {
            Ok(report) if &report.account_id == account_id => {
                debug!(report = %id, account = %account_id, "report cache hit");
                return Ok(report);
            }
            Ok(report) => {
                warn!(
                    report = %id,
                    account = %account_id,
                    owner = %report.account_id,
                    "cached report belongs to another account"
                );
                return Err(LedgerError::report_not_found(id.as_str()));
            }
            Err(err) => lookup_failed("report", account_id, &err),
        }

        // Totals are recomputed under the filter the report was created
        // with, so writes made since the snapshot show up.
        cancel.check()?;
        let stored = self.store.get_report(cancel, account_id, id)?;
        let report = self.compose_report(
            cancel,
            stored.id,
            &stored.account_id,
            stored.name,
            &stored.period,
            stored.currency_filter.as_deref(),
        )?;
        self.cache_report(cancel, &report);
        Ok(report)
    }

    fn update_report(&self, cancel: &CancelToken, input: ReportUpdate) -> LedgerResult<Report> {
        cancel.check()?;
        let current = self.store.get_report(cancel, &input.account_id, &input.id)?;
        let period = input.period.unwrap_or(current.period);
        let currency = input.currency.or(current.currency_filter);

        let mut report = self.compose_report(
            cancel,
            current.id,
            &current.account_id,
            input.name,
            &period,
            currency.as_deref(),
        )?;
        if let Some(generated_at) = input.generated_at {
            report.generated_at = generated_at;
        }
        let updated = self.store.update_report(cancel, report)?;
        self.cache_report(cancel, &updated);

        debug!(report = %updated.id, account = %updated.account_id, period = %updated.period, "updated report");
        Ok(updated)
    }

    fn delete_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<()> {
        cancel.check()?;
        self.store.delete_report(cancel, account_id, id)?;
        // Committed; the cached copy goes regardless of the token
        if let Err(err) = self.cache.delete_report(CancelToken::none(), id) {
            write_failed("report", account_id, &err);
        }

        debug!(report = %id, account = %account_id, "deleted report");
        Ok(())
    }

    fn list_reports(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Report>> {
        self.store.list_reports(cancel, account_id)
    }

    fn report_summary(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        period: &str,
        currency: Option<&str>,
    ) -> LedgerResult<ReportSummary> {
        cancel.check()?;
        let parsed = ReportPeriod::parse(period)?;
        let key = SummaryKey {
            account_id: account_id.clone(),
            start: parsed.start(),
            end: parsed.end(),
            currency: currency
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };

        match self.cache.get_summary(cancel, &key) {
            Ok(summary) => {
                debug!(account = %account_id, period, "summary cache hit");
                return Ok(summary);
            }
            Err(err) => lookup_failed("summary", account_id, &err),
        }

        cancel.check()?;
        let summary = self.summarize(cancel, account_id, &parsed, key.currency.as_deref())?;
        if let Err(err) = self.cache.set_summary(cancel, &key, &summary) {
            write_failed("summary", account_id, &err);
        }
        Ok(summary)
    }

    fn import_transactions_csv(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        content: &[u8],
        has_header: bool,
    ) -> Result<usize, ImportError> {
        cancel.check().map_err(ImportError::before_rows)?;
        let records = read_records(content).map_err(ImportError::before_rows)?;

        let mut imported = 0;
        for (index, record) in records.iter().enumerate().skip(usize::from(has_header)) {
            let row = index + 1;
            let input =
                parse_record(record, account_id).map_err(|e| ImportError::at_row(imported, row, e))?;
            self.create_transaction(cancel, input)
                .map_err(|e| ImportError::at_row(imported, row, e))?;
            imported += 1;
        }

        info!(account = %account_id, imported, "imported transactions from CSV");
        Ok(imported)
    }

    fn export_transactions_csv(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<u8>> {
        let transactions = self.store.list_transactions(cancel, account_id)?;
        let mut buffer = Vec::new();
        export::export_transactions_csv(&transactions, &mut buffer)?;

        debug!(account = %account_id, count = transactions.len(), "exported transactions");
        Ok(buffer)
    }
}
