//! Reports module for the ledger
//!
//! Aggregates transactions into income/expense totals and per-category
//! budget utilization for an arbitrary period.

pub mod summary;

pub use summary::{build_summary, prorated_budget, usage_percent, ReportSummary};
