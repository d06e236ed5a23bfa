//! Input validation layer
//!
//! [`ValidatingLedgerService`] checks every request and only then hands it
//! to the wrapped service. The wrapped service assumes well-formed input.

use crate::cancel::CancelToken;
use crate::error::{ImportError, LedgerError, LedgerResult};
use crate::models::{
    AccountId, Budget, BudgetId, BudgetUpdate, NewBudget, NewReport, NewTransaction, Report,
    ReportId, ReportUpdate, Transaction, TransactionId, TransactionUpdate,
};
use crate::reports::ReportSummary;

use super::LedgerService;

/// Decorator that validates requests before delegating
pub struct ValidatingLedgerService<S> {
    inner: S,
}

impl<S: LedgerService> ValidatingLedgerService<S> {
    /// Wrap a service
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Get the wrapped service
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn require_account(account_id: &AccountId) -> LedgerResult<()> {
    require(!account_id.is_empty(), "account id is required")
}

fn require(present: bool, message: &str) -> LedgerResult<()> {
    if present {
        Ok(())
    } else {
        Err(LedgerError::Validation(message.to_string()))
    }
}

impl<S: LedgerService> LedgerService for ValidatingLedgerService<S> {
    fn create_transaction(
        &self,
        cancel: &CancelToken,
        input: NewTransaction,
    ) -> LedgerResult<Transaction> {
        input.validate()?;
        self.inner.create_transaction(cancel, input)
    }

    fn get_transaction(
        &self,
        cancel: &CancelToken,
        id: &TransactionId,
    ) -> LedgerResult<Transaction> {
        require(!id.is_empty(), "transaction id is required")?;
        self.inner.get_transaction(cancel, id)
    }

    fn update_transaction(
        &self,
        cancel: &CancelToken,
        input: TransactionUpdate,
    ) -> LedgerResult<Transaction> {
        input.validate()?;
        self.inner.update_transaction(cancel, input)
    }

    fn delete_transaction(&self, cancel: &CancelToken, id: &TransactionId) -> LedgerResult<()> {
        require(!id.is_empty(), "transaction id is required")?;
        self.inner.delete_transaction(cancel, id)
    }

    fn list_transactions(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Transaction>> {
        self.inner.list_transactions(cancel, account_id)
    }

    fn create_budget(&self, cancel: &CancelToken, input: NewBudget) -> LedgerResult<Budget> {
        input.validate()?;
        self.inner.create_budget(cancel, input)
    }

    fn get_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<Budget> {
        require_account(account_id)?;
        require(!id.is_empty(), "budget id is required")?;
        self.inner.get_budget(cancel, account_id, id)
    }

    fn update_budget(&self, cancel: &CancelToken, input: BudgetUpdate) -> LedgerResult<Budget> {
        input.validate()?;
        self.inner.update_budget(cancel, input)
    }

    fn delete_budget(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &BudgetId,
    ) -> LedgerResult<()> {
        require_account(account_id)?;
        require(!id.is_empty(), "budget id is required")?;
        self.inner.delete_budget(cancel, account_id, id)
    }

    fn list_budgets(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Budget>> {
        self.inner.list_budgets(cancel, account_id)
    }

    fn create_report(&self, cancel: &CancelToken, input: NewReport) -> LedgerResult<Report> {
        input.validate()?;
        self.inner.create_report(cancel, input)
    }

    fn get_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<Report> {
        require_account(account_id)?;
        require(!id.is_empty(), "report id is required")?;
        self.inner.get_report(cancel, account_id, id)
    }

    fn update_report(&self, cancel: &CancelToken, input: ReportUpdate) -> LedgerResult<Report> {
        input.validate()?;
        self.inner.update_report(cancel, input)
    }

    fn delete_report(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        id: &ReportId,
    ) -> LedgerResult<()> {
        require_account(account_id)?;
        require(!id.is_empty(), "report id is required")?;
        self.inner.delete_report(cancel, account_id, id)
    }

    fn list_reports(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<Report>> {
        self.inner.list_reports(cancel, account_id)
    }

    fn report_summary(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        period: &str,
        currency: Option<&str>,
    ) -> LedgerResult<ReportSummary> {
        require_account(account_id)?;
        require(!period.trim().is_empty(), "period is required")?;
        self.inner.report_summary(cancel, account_id, period, currency)
    }

    fn import_transactions_csv(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        content: &[u8],
        has_header: bool,
    ) -> Result<usize, ImportError> {
        require_account(account_id).map_err(ImportError::before_rows)?;
        require(!content.is_empty(), "csv content is required").map_err(ImportError::before_rows)?;
        self.inner
            .import_transactions_csv(cancel, account_id, content, has_header)
    }

    fn export_transactions_csv(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> LedgerResult<Vec<u8>> {
        self.inner.export_transactions_csv(cancel, account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{BudgetCadence, Money};
    use crate::services::DefaultLedgerService;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn create_test_service() -> ValidatingLedgerService<DefaultLedgerService> {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        ));
        ValidatingLedgerService::new(DefaultLedgerService::without_cache(
            Arc::new(MemoryStore::new()),
            clock,
        ))
    }

    fn message(err: LedgerError) -> String {
        match err {
            LedgerError::Validation(message) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_transaction_inputs_checked() {
        let cancel = CancelToken::none();
        let service = create_test_service();

        let zero = NewTransaction::new("acc-1", 0.0, "USD", "Food");
        assert_eq!(
            message(service.create_transaction(cancel, zero).unwrap_err()),
            "amount must be non-zero"
        );

        let no_account = NewTransaction::new("", -1.0, "USD", "Food");
        assert_eq!(
            message(service.create_transaction(cancel, no_account).unwrap_err()),
            "account id is required"
        );

        let txn = service
            .create_transaction(cancel, NewTransaction::new("acc-1", -1.0, "USD", "Food"))
            .unwrap();

        let mut update = TransactionUpdate::from_transaction(&txn);
        update.id = TransactionId::default();
        assert_eq!(
            message(service.update_transaction(cancel, update).unwrap_err()),
            "transaction id is required"
        );

        let empty = TransactionId::default();
        assert!(service.get_transaction(cancel, &empty).unwrap_err().is_validation());
        assert!(service.delete_transaction(cancel, &empty).unwrap_err().is_validation());
        assert_eq!(service.get_transaction(cancel, &txn.id).unwrap(), txn);
    }

    #[test]
    fn test_budget_inputs_checked() {
        let cancel = CancelToken::none();
        let service = create_test_service();
        let may = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        let mut weekly = NewBudget::monthly("acc-1", "Food", 100.0, "USD", may);
        weekly.cadence = BudgetCadence::Weekly;
        assert!(service.create_budget(cancel, weekly).unwrap_err().is_validation());

        let unaligned = NewBudget::monthly(
            "acc-1",
            "Food",
            100.0,
            "USD",
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
        );
        assert!(service.create_budget(cancel, unaligned).unwrap_err().is_validation());

        let negative = NewBudget::monthly("acc-1", "Food", -5.0, "USD", may);
        assert!(service.create_budget(cancel, negative).unwrap_err().is_validation());

        let budget = service
            .create_budget(cancel, NewBudget::monthly("acc-1", "Food", 100.0, "USD", may))
            .unwrap();
        assert_eq!(budget.amount, Money::new(100.0));

        let empty_account = AccountId::default();
        assert_eq!(
            message(service.get_budget(cancel, &empty_account, &budget.id).unwrap_err()),
            "account id is required"
        );
        assert_eq!(
            message(
                service
                    .delete_budget(cancel, &AccountId::from("acc-1"), &BudgetId::default())
                    .unwrap_err()
            ),
            "budget id is required"
        );
    }

    #[test]
    fn test_report_inputs_checked() {
        let cancel = CancelToken::none();
        let service = create_test_service();

        let unnamed = NewReport::new("acc-1", " ", "2024-05");
        assert!(service.create_report(cancel, unnamed).unwrap_err().is_validation());

        let no_period = NewReport::new("acc-1", "May", "");
        assert!(service.create_report(cancel, no_period).unwrap_err().is_validation());

        let report = service
            .create_report(cancel, NewReport::new("acc-1", "May", "2024-05"))
            .unwrap();

        let blank_period = ReportUpdate::new("acc-1", report.id.clone(), "May").with_period("  ");
        assert!(service.update_report(cancel, blank_period).unwrap_err().is_validation());

        assert!(service
            .get_report(cancel, &AccountId::from("acc-1"), &ReportId::default())
            .unwrap_err()
            .is_validation());
        assert!(service
            .delete_report(cancel, &AccountId::default(), &report.id)
            .unwrap_err()
            .is_validation());
        assert!(service
            .report_summary(cancel, &AccountId::from("acc-1"), " ", None)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_import_requires_account_and_content() {
        let cancel = CancelToken::none();
        let service = create_test_service();
        let row = b"acc-1,5,USD,Gift,x,2024-05-01T10:00:00Z\n";

        let err = service
            .import_transactions_csv(cancel, &AccountId::default(), row, false)
            .unwrap_err();
        assert_eq!(err.imported, 0);
        assert_eq!(err.row, None);
        assert!(err.error.is_validation());

        let err = service
            .import_transactions_csv(cancel, &AccountId::from("acc-1"), b"", false)
            .unwrap_err();
        assert!(err.error.is_validation());

        let imported = service
            .import_transactions_csv(cancel, &AccountId::from("acc-1"), row, false)
            .unwrap();
        assert_eq!(imported, 1);
    }

    #[test]
    fn test_lists_pass_through() {
        let cancel = CancelToken::none();
        let service = create_test_service();
        let empty = AccountId::default();

        assert!(service.list_transactions(cancel, &empty).unwrap().is_empty());
        assert!(service.list_budgets(cancel, &empty).unwrap().is_empty());
        assert!(service.list_reports(cancel, &empty).unwrap().is_empty());
        assert_eq!(
            service.export_transactions_csv(cancel, &empty).unwrap(),
            b"account_id,amount,currency,category,description,occurred_at\n".to_vec()
        );
    }
}
