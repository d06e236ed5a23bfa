//! Transaction model
//!
//! A transaction is a signed amount in one currency, filed under a free-form
//! category label. Positive amounts are income, negative amounts are expense.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, TransactionId};
use super::money::Money;

/// A recorded ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// The account this transaction belongs to
    pub account_id: AccountId,

    /// Amount (positive for income, negative for expense)
    pub amount: Money,

    /// ISO currency code, e.g. `USD`
    pub currency: String,

    /// Category label, matched against budget names
    pub category: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// When the money moved
    pub occurred_at: DateTime<Utc>,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Check if this is income (positive amount)
    pub fn is_income(&self) -> bool {
        self.amount.is_positive()
    }

    /// Check if this is an expense (negative amount)
    pub fn is_expense(&self) -> bool {
        self.amount.is_negative()
    }

    /// Absolute expense amount, zero for income
    pub fn expense_amount(&self) -> Money {
        if self.is_expense() {
            self.amount.abs()
        } else {
            Money::zero()
        }
    }
}

/// Input for recording a new transaction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Caller-chosen id; one is generated when absent
    #[serde(default)]
    pub id: Option<TransactionId>,
    pub account_id: AccountId,
    pub amount: Money,
    pub currency: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to the current time when absent
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewTransaction {
    /// Start an input with the required fields
    pub fn new(
        account_id: impl Into<AccountId>,
        amount: impl Into<Money>,
        currency: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            account_id: account_id.into(),
            amount: amount.into(),
            currency: currency.into(),
            category: category.into(),
            description: String::new(),
            occurred_at: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set when the transaction occurred
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Use a caller-chosen id
    pub fn with_id(mut self, id: impl Into<TransactionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Validate the input
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        validate_fields(&self.account_id, self.amount, &self.currency, &self.category)
    }
}

/// Input for replacing an existing transaction
///
/// `created_at` is never taken from the caller. An absent `occurred_at`
/// keeps the stored value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount: Money,
    pub currency: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionUpdate {
    /// Build an update that rewrites every field of `existing`
    pub fn from_transaction(existing: &Transaction) -> Self {
        Self {
            id: existing.id.clone(),
            account_id: existing.account_id.clone(),
            amount: existing.amount,
            currency: existing.currency.clone(),
            category: existing.category.clone(),
            description: existing.description.clone(),
            occurred_at: Some(existing.occurred_at),
        }
    }

    /// Validate the input
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.id.is_empty() {
            return Err(TransactionValidationError::MissingId);
        }
        validate_fields(&self.account_id, self.amount, &self.currency, &self.category)
    }
}

fn validate_fields(
    account_id: &AccountId,
    amount: Money,
    currency: &str,
    category: &str,
) -> Result<(), TransactionValidationError> {
    if account_id.is_empty() {
        return Err(TransactionValidationError::MissingAccount);
    }
    if amount.is_zero() {
        return Err(TransactionValidationError::ZeroAmount);
    }
    if currency.trim().is_empty() {
        return Err(TransactionValidationError::MissingCurrency);
    }
    if category.trim().is_empty() {
        return Err(TransactionValidationError::MissingCategory);
    }
    Ok(())
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionValidationError {
    #[error("transaction id is required")]
    MissingId,

    #[error("account id is required")]
    MissingAccount,

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("currency is required")]
    MissingCurrency,

    #[error("category is required")]
    MissingCategory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Transaction {
        let at = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        Transaction {
            id: TransactionId::from("t-1"),
            account_id: AccountId::from("acc-1"),
            amount: Money::new(-40.0),
            currency: "USD".into(),
            category: "Food".into(),
            description: "groceries".into(),
            occurred_at: at,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_expense_amount() {
        let mut txn = sample();
        assert!(txn.is_expense());
        assert_eq!(txn.expense_amount(), Money::new(40.0));

        txn.amount = Money::new(100.0);
        assert!(txn.is_income());
        assert_eq!(txn.expense_amount(), Money::zero());
    }

    #[test]
    fn test_new_transaction_validation() {
        let input = NewTransaction::new("acc-1", -40.0, "USD", "Food");
        assert!(input.validate().is_ok());

        let zero = NewTransaction::new("acc-1", 0.0, "USD", "Food");
        assert_eq!(zero.validate(), Err(TransactionValidationError::ZeroAmount));

        let no_account = NewTransaction::new("", 10.0, "USD", "Food");
        assert_eq!(
            no_account.validate(),
            Err(TransactionValidationError::MissingAccount)
        );

        let no_currency = NewTransaction::new("acc-1", 10.0, " ", "Food");
        assert_eq!(
            no_currency.validate(),
            Err(TransactionValidationError::MissingCurrency)
        );

        let no_category = NewTransaction::new("acc-1", 10.0, "USD", "");
        assert_eq!(
            no_category.validate(),
            Err(TransactionValidationError::MissingCategory)
        );
    }

    #[test]
    fn test_update_requires_id() {
        let mut update = TransactionUpdate::from_transaction(&sample());
        assert!(update.validate().is_ok());

        update.id = TransactionId::default();
        assert_eq!(update.validate(), Err(TransactionValidationError::MissingId));
    }

    #[test]
    fn test_serialization() {
        let txn = sample();
        let json = serde_json::to_string(&txn).unwrap();
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(txn, deserialized);
    }
}
