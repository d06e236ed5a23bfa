//! Budget model
//!
//! A budget caps expense for one category and currency over a single
//! calendar month. The budget's `name` is the category label it applies to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, BudgetId};
use super::money::Money;
use super::period::{is_month_start, month_bounds};
use super::transaction::Transaction;

/// How often a budget resets
///
/// Only `Monthly` budgets are accepted for writes; the other cadences exist
/// so that stored data using them deserializes and is rejected cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetCadence {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl fmt::Display for BudgetCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

/// A monthly spending cap for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier
    pub id: BudgetId,

    /// Owning account
    pub account_id: AccountId,

    /// Category label this budget caps
    pub name: String,

    /// Cap for the month (always positive)
    pub amount: Money,

    /// Currency of the cap
    pub currency: String,

    /// Reset cadence
    #[serde(default)]
    pub cadence: BudgetCadence,

    /// First instant of the month the budget applies to
    pub month: DateTime<Utc>,

    /// When the budget was created
    pub created_at: DateTime<Utc>,

    /// When the budget was last modified
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// `[first instant, last instant]` of the budget's month
    pub fn month_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        month_bounds(self.month)
    }

    /// Check if an instant falls inside the budget's month
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        let (start, end) = self.month_range();
        instant >= start && instant <= end
    }

    /// Check if this budget caps the given transaction
    ///
    /// Account, currency and category must all be equal and the transaction
    /// must have occurred inside the budget's month.
    pub fn matches(&self, txn: &Transaction) -> bool {
        self.account_id == txn.account_id
            && self.currency == txn.currency
            && self.name == txn.category
            && self.covers(txn.occurred_at)
    }
}

/// Input for creating a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudget {
    /// Caller-chosen id; one is generated when absent
    #[serde(default)]
    pub id: Option<BudgetId>,
    pub account_id: AccountId,
    pub name: String,
    pub amount: Money,
    pub currency: String,
    #[serde(default)]
    pub cadence: BudgetCadence,
    pub month: DateTime<Utc>,
}

impl NewBudget {
    /// Start a monthly budget input
    pub fn monthly(
        account_id: impl Into<AccountId>,
        name: impl Into<String>,
        amount: impl Into<Money>,
        currency: impl Into<String>,
        month: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            account_id: account_id.into(),
            name: name.into(),
            amount: amount.into(),
            currency: currency.into(),
            cadence: BudgetCadence::Monthly,
            month,
        }
    }

    /// Use a caller-chosen id
    pub fn with_id(mut self, id: impl Into<BudgetId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Validate the input
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        validate_fields(
            &self.account_id,
            &self.name,
            self.amount,
            &self.currency,
            self.cadence,
        )?;
        validate_month(self.month)
    }
}

/// Input for replacing a budget
///
/// An absent `month` keeps the stored month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub id: BudgetId,
    pub account_id: AccountId,
    pub name: String,
    pub amount: Money,
    pub currency: String,
    #[serde(default)]
    pub cadence: BudgetCadence,
    #[serde(default)]
    pub month: Option<DateTime<Utc>>,
}

impl BudgetUpdate {
    /// Build an update that rewrites every field of `existing`
    pub fn from_budget(existing: &Budget) -> Self {
        Self {
            id: existing.id.clone(),
            account_id: existing.account_id.clone(),
            name: existing.name.clone(),
            amount: existing.amount,
            currency: existing.currency.clone(),
            cadence: existing.cadence,
            month: Some(existing.month),
        }
    }

    /// Validate the input
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.id.is_empty() {
            return Err(BudgetValidationError::MissingId);
        }
        validate_fields(
            &self.account_id,
            &self.name,
            self.amount,
            &self.currency,
            self.cadence,
        )?;
        match self.month {
            Some(month) => validate_month(month),
            None => Ok(()),
        }
    }
}

fn validate_fields(
    account_id: &AccountId,
    name: &str,
    amount: Money,
    currency: &str,
    cadence: BudgetCadence,
) -> Result<(), BudgetValidationError> {
    if account_id.is_empty() {
        return Err(BudgetValidationError::MissingAccount);
    }
    if name.trim().is_empty() {
        return Err(BudgetValidationError::MissingName);
    }
    if !amount.is_positive() {
        return Err(BudgetValidationError::NonPositiveAmount);
    }
    if currency.trim().is_empty() {
        return Err(BudgetValidationError::MissingCurrency);
    }
    if cadence != BudgetCadence::Monthly {
        return Err(BudgetValidationError::UnsupportedCadence(cadence));
    }
    Ok(())
}

fn validate_month(month: DateTime<Utc>) -> Result<(), BudgetValidationError> {
    if !is_month_start(month) {
        return Err(BudgetValidationError::MonthNotAligned);
    }
    Ok(())
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BudgetValidationError {
    #[error("budget id is required")]
    MissingId,

    #[error("account id is required")]
    MissingAccount,

    #[error("budget name is required")]
    MissingName,

    #[error("budget amount must be positive")]
    NonPositiveAmount,

    #[error("currency is required")]
    MissingCurrency,

    #[error("period must be monthly, got {0}")]
    UnsupportedCadence(BudgetCadence),

    #[error("month must be the first day of the month at 00:00:00Z")]
    MonthNotAligned,
}
