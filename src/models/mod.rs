//! Core data models for the ledger
//!
//! This module contains the data structures of the ledger domain:
//! transactions, budgets, reports, and the write inputs for each.

pub mod budget;
pub mod ids;
pub mod money;
pub mod period;
pub mod report;
pub mod transaction;

pub use budget::{Budget, BudgetCadence, BudgetUpdate, BudgetValidationError, NewBudget};
pub use ids::{AccountId, BudgetId, ReportId, TransactionId};
pub use money::{Money, MoneyParseError};
pub use period::{PeriodParseError, ReportPeriod};
pub use report::{NewReport, Report, ReportCategory, ReportUpdate, ReportValidationError};
pub use transaction::{
    NewTransaction, Transaction, TransactionUpdate, TransactionValidationError,
};
