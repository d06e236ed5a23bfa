//! Report repository for JSON storage
//!
//! Manages loading and saving reports to reports.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, Report, ReportId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ReportData {
    #[serde(default)]
    reports: Vec<Report>,
}

/// Repository for report persistence
pub struct ReportRepository {
    path: PathBuf,
    reports: RwLock<HashMap<ReportId, Report>>,
}

impl ReportRepository {
    /// Create a new report repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            reports: RwLock::new(HashMap::new()),
        }
    }

    /// Load reports from disk
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: ReportData = read_json(&self.path)?;

        let mut reports = self
            .reports
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        reports.clear();
        for report in file_data.reports {
            reports.insert(report.id.clone(), report);
        }

        Ok(())
    }

    /// Save reports to disk
    pub fn save(&self) -> LedgerResult<()> {
        let reports = self
            .reports
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = reports.values().cloned().collect();
        sort_reports(&mut list);

        write_json_atomic(&self.path, &ReportData { reports: list })
    }

    /// Get a report by ID regardless of account
    pub fn get(&self, id: &ReportId) -> LedgerResult<Option<Report>> {
        let reports = self
            .reports
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(reports.get(id).cloned())
    }

    /// Get all reports for an account
    pub fn get_by_account(&self, account_id: &AccountId) -> LedgerResult<Vec<Report>> {
        let reports = self
            .reports
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = reports
            .values()
            .filter(|r| &r.account_id == account_id)
            .cloned()
            .collect();
        sort_reports(&mut list);
        Ok(list)
    }

    /// Insert or replace a report, returning the previous version
    pub fn upsert(&self, report: Report) -> LedgerResult<Option<Report>> {
        let mut reports = self
            .reports
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(reports.insert(report.id.clone(), report))
    }

    /// Delete a report, returning it if it existed
    pub fn delete(&self, id: &ReportId) -> LedgerResult<Option<Report>> {
        let mut reports = self
            .reports
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(reports.remove(id))
    }
}

/// Deterministic listing order: generation time, then id
pub(crate) fn sort_reports(reports: &mut [Report]) {
    reports.sort_by(|a, b| {
        a.generated_at
            .cmp(&b.generated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn report(id: &str, account: &str) -> Report {
        Report {
            id: ReportId::from(id),
            account_id: AccountId::from(account),
            name: "May".into(),
            period: "2024-05".into(),
            generated_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
            currency: "USD".into(),
            currency_filter: None,
            total_income: Money::zero(),
            total_expense: Money::new(90.0),
            categories: Vec::new(),
        }
    }

    #[test]
    fn test_save_reload_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports.json");
        let repo = ReportRepository::new(path.clone());

        repo.upsert(report("rep-1", "acc-1")).unwrap();
        repo.upsert(report("rep-2", "acc-2")).unwrap();
        repo.save().unwrap();

        let reloaded = ReportRepository::new(path);
        reloaded.load().unwrap();
        assert_eq!(
            reloaded.get_by_account(&AccountId::from("acc-1")).unwrap().len(),
            1
        );

        assert!(reloaded.delete(&ReportId::from("rep-1")).unwrap().is_some());
        assert!(reloaded.get(&ReportId::from("rep-1")).unwrap().is_none());
    }
}
