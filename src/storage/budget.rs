//! Budget repository for JSON storage
//!
//! Manages loading and saving budgets to budgets.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, Budget, BudgetId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable budget data
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BudgetData {
    #[serde(default)]
    budgets: Vec<Budget>,
}

/// Repository for budget persistence
pub struct BudgetRepository {
    path: PathBuf,
    budgets: RwLock<HashMap<BudgetId, Budget>>,
}

impl BudgetRepository {
    /// Create a new budget repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            budgets: RwLock::new(HashMap::new()),
        }
    }

    /// Load budgets from disk
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: BudgetData = read_json(&self.path)?;

        let mut budgets = self
            .budgets
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        budgets.clear();
        for budget in file_data.budgets {
            budgets.insert(budget.id.clone(), budget);
        }

        Ok(())
    }

    /// Save budgets to disk
    pub fn save(&self) -> LedgerResult<()> {
        let budgets = self
            .budgets
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = budgets.values().cloned().collect();
        sort_budgets(&mut list);

        write_json_atomic(&self.path, &BudgetData { budgets: list })
    }

    /// Get a budget by ID regardless of account
    pub fn get(&self, id: &BudgetId) -> LedgerResult<Option<Budget>> {
        let budgets = self
            .budgets
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(budgets.get(id).cloned())
    }

    /// Get all budgets for an account
    pub fn get_by_account(&self, account_id: &AccountId) -> LedgerResult<Vec<Budget>> {
        let budgets = self
            .budgets
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = budgets
            .values()
            .filter(|b| &b.account_id == account_id)
            .cloned()
            .collect();
        sort_budgets(&mut list);
        Ok(list)
    }

    /// Insert or replace a budget, returning the previous version
    pub fn upsert(&self, budget: Budget) -> LedgerResult<Option<Budget>> {
        let mut budgets = self
            .budgets
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(budgets.insert(budget.id.clone(), budget))
    }

    /// Delete a budget, returning it if it existed
    pub fn delete(&self, id: &BudgetId) -> LedgerResult<Option<Budget>> {
        let mut budgets = self
            .budgets
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(budgets.remove(id))
    }
}

/// Deterministic listing order: month, then name, then id
pub(crate) fn sort_budgets(budgets: &mut [Budget]) {
    budgets.sort_by(|a, b| {
        a.month
            .cmp(&b.month)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetCadence, Money};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BudgetRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");
        let repo = BudgetRepository::new(path);
        (temp_dir, repo)
    }

    fn budget(id: &str, account: &str, name: &str, month: u32) -> Budget {
        let at = Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap();
        Budget {
            id: BudgetId::from(id),
            account_id: AccountId::from(account),
            name: name.into(),
            amount: Money::new(100.0),
            currency: "USD".into(),
            cadence: BudgetCadence::Monthly,
            month: at,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_get_by_account_is_sorted() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(budget("b-2", "acc-1", "Rent", 5)).unwrap();
        repo.upsert(budget("b-1", "acc-1", "Food", 5)).unwrap();
        repo.upsert(budget("b-0", "acc-1", "Zoo", 4)).unwrap();
        repo.upsert(budget("b-9", "acc-2", "Food", 5)).unwrap();

        let names: Vec<_> = repo
            .get_by_account(&AccountId::from("acc-1"))
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Zoo", "Food", "Rent"]);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let b = budget("b-1", "acc-1", "Food", 5);
        repo.upsert(b.clone()).unwrap();
        repo.save().unwrap();

        let repo2 = BudgetRepository::new(temp_dir.path().join("budgets.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get(&b.id).unwrap(), Some(b));
    }
}
