//! Report model
//!
//! A report is a named, persisted snapshot of the aggregate for one period.
//! Its totals and categories are always recomputed from transactions and
//! budgets on create and update; callers only choose the name, period and
//! optional currency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, ReportId};
use super::money::Money;

/// Per-category line of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCategory {
    /// Category label
    pub category: String,

    /// Expense in this category over the period
    pub total_expense: Money,

    /// Budget available for the period after proration
    pub budget_amount: Money,

    /// `total_expense / budget_amount * 100`; absent when no budget applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_usage_percent: Option<f64>,
}

/// A persisted report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier
    pub id: ReportId,

    /// Owning account
    pub account_id: AccountId,

    /// Display name
    pub name: String,

    /// Period expression, `YYYY-MM` or `<start>/<end>`
    pub period: String,

    /// When the figures were computed
    pub generated_at: DateTime<Utc>,

    /// Currency of the figures; empty when the period had no activity
    #[serde(default)]
    pub currency: String,

    /// Currency the caller asked for; `None` aggregates every currency.
    /// Recomputing the report reapplies this filter, not `currency`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_filter: Option<String>,

    /// Sum of income over the period
    pub total_income: Money,

    /// Sum of expense (as a positive amount) over the period
    pub total_expense: Money,

    /// Breakdown by category, sorted by category label
    #[serde(default)]
    pub categories: Vec<ReportCategory>,
}

impl Report {
    /// Income minus expense
    pub fn net(&self) -> Money {
        self.total_income - self.total_expense
    }

    /// Look up the line for a category
    pub fn category(&self, name: &str) -> Option<&ReportCategory> {
        self.categories.iter().find(|c| c.category == name)
    }
}

/// Input for creating a report
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewReport {
    /// Caller-chosen id; one is generated when absent
    #[serde(default)]
    pub id: Option<ReportId>,
    pub account_id: AccountId,
    pub name: String,
    pub period: String,
    /// Restrict figures to one currency
    #[serde(default)]
    pub currency: Option<String>,
    /// Defaults to the current time when absent
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl NewReport {
    /// Start a report input for a period
    pub fn new(
        account_id: impl Into<AccountId>,
        name: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            account_id: account_id.into(),
            name: name.into(),
            period: period.into(),
            currency: None,
            generated_at: None,
        }
    }

    /// Restrict the report to one currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Use a caller-chosen id
    pub fn with_id(mut self, id: impl Into<ReportId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Validate the input
    pub fn validate(&self) -> Result<(), ReportValidationError> {
        if self.account_id.is_empty() {
            return Err(ReportValidationError::MissingAccount);
        }
        if self.period.trim().is_empty() {
            return Err(ReportValidationError::MissingPeriod);
        }
        if self.name.trim().is_empty() {
            return Err(ReportValidationError::MissingName);
        }
        Ok(())
    }
}

/// Input for recomputing a report
///
/// Absent `period` and `currency` keep the stored values. An empty
/// `currency` drops the filter so every currency counts. `generated_at`
/// refreshes to the current time unless given.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportUpdate {
    pub id: ReportId,
    pub account_id: AccountId,
    pub name: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl ReportUpdate {
    /// Start an update that only renames the report and refreshes its figures
    pub fn new(
        account_id: impl Into<AccountId>,
        id: impl Into<ReportId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            name: name.into(),
            period: None,
            currency: None,
            generated_at: None,
        }
    }

    /// Move the report to another period
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    /// Restrict the report to another currency; empty aggregates all of them
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Validate the input
    pub fn validate(&self) -> Result<(), ReportValidationError> {
        if self.id.is_empty() {
            return Err(ReportValidationError::MissingId);
        }
        if self.account_id.is_empty() {
            return Err(ReportValidationError::MissingAccount);
        }
        if matches!(&self.period, Some(p) if p.trim().is_empty()) {
            return Err(ReportValidationError::MissingPeriod);
        }
        if self.name.trim().is_empty() {
            return Err(ReportValidationError::MissingName);
        }
        Ok(())
    }
}

/// Validation errors for reports
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportValidationError {
    #[error("report id is required")]
    MissingId,

    #[error("account id is required")]
    MissingAccount,

    #[error("period is required")]
    MissingPeriod,

    #[error("report name is required")]
    MissingName,
}
