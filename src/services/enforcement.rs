//! Budget enforcement
//!
//! An expense may only be written if, for every budget that matches it, the
//! expense already recorded in that budget's month plus the new amount stays
//! within the budget. Income is never checked, and a transaction with no
//! matching budget is always allowed.

use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Budget, Money, Transaction};

/// Reject `txn` if it would overrun any matching budget
///
/// `existing` holds the account's stored transactions. An entry with the
/// same id as `txn` is the version being replaced and is not counted.
pub fn ensure_budget_available(
    txn: &Transaction,
    budgets: &[Budget],
    existing: &[Transaction],
) -> LedgerResult<()> {
    if !txn.is_expense() {
        return Ok(());
    }

    let expense = txn.amount.abs();
    for budget in budgets.iter().filter(|b| b.matches(txn)) {
        let spent: Money = existing
            .iter()
            .filter(|other| other.id != txn.id && other.is_expense() && budget.matches(other))
            .map(|other| other.amount.abs())
            .sum();

        if spent + expense > budget.amount {
            info!(
                account = %txn.account_id,
                budget = %budget.id,
                category = %budget.name,
                spent = %spent,
                attempted = %expense,
                limit = %budget.amount,
                "rejected expense over budget"
            );
            return Err(LedgerError::BudgetExceeded {
                budget: budget.id.to_string(),
                category: budget.name.clone(),
            });
        }
    }

    Ok(())
}
