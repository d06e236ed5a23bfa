//! Export functionality for the ledger
//!
//! Serializes an account's transactions to the CSV layout accepted by the
//! importer.

pub mod csv;

pub use self::csv::{export_transactions_csv, TRANSACTION_CSV_HEADER};
