//! Custom error types for the ledger core
//!
//! This module defines the error hierarchy for the crate using thiserror.
//! Callers (transport adapters) classify errors through the `is_*`
//! predicates rather than by matching on message text.

use thiserror::Error;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity absent, or present under another account
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// An expense write would overrun a matching monthly budget
    #[error("Budget exceeded: {category} budget {budget}")]
    BudgetExceeded { budget: String, category: String },

    /// Uniqueness conflict raised by a store
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The caller's cancel token tripped before the work finished
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// CSV reader/writer errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Store backend errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for reports
    pub fn report_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Report",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this write was rejected by budget enforcement
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. })
    }

    /// Check if this is a uniqueness conflict
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Check if the caller cancelled the operation or its deadline passed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is an opaque backend failure rather than an expected outcome
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Csv(_) | Self::Storage(_)
        )
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

macro_rules! validation_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for LedgerError {
                fn from(err: $source) -> Self {
                    Self::Validation(err.to_string())
                }
            }
        )+
    };
}

validation_from!(
    crate::models::TransactionValidationError,
    crate::models::BudgetValidationError,
    crate::models::ReportValidationError,
    crate::models::PeriodParseError,
    crate::models::MoneyParseError,
);

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A CSV import that stopped early
///
/// Rows before `row` were committed and stay committed; `imported` counts them.
#[derive(Error, Debug)]
#[error("Import stopped after {imported} row(s): {error}")]
pub struct ImportError {
    /// Rows committed before the failure
    pub imported: usize,
    /// 1-based CSV row that failed, if the failure belongs to a row
    pub row: Option<usize>,
    /// The underlying, classifiable error
    #[source]
    pub error: LedgerError,
}

impl ImportError {
    /// Wrap an error that happened before any row was read
    pub fn before_rows(error: LedgerError) -> Self {
        Self {
            imported: 0,
            row: None,
            error,
        }
    }

    /// Wrap an error raised while processing a specific row
    pub fn at_row(imported: usize, row: usize, error: LedgerError) -> Self {
        Self {
            imported,
            row: Some(row),
            error,
        }
    }
}
