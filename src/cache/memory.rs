//! In-process TTL cache
//!
//! Entries expire `ttl` after they were written, measured with the injected
//! [`Clock`]. Expired entries are dropped lazily on read, or eagerly with
//! [`MemoryCache::purge_expired`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::clock::{Clock, SystemClock};
use crate::models::{AccountId, Budget, Report, ReportId};
use crate::reports::ReportSummary;

use super::{AggregateCache, CacheError, CacheResult, SummaryKey};

struct Entry<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

impl<T> Entry<T> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct CacheState {
    reports: HashMap<ReportId, Entry<Report>>,
    summaries: HashMap<SummaryKey, Entry<ReportSummary>>,
    budget_lists: HashMap<AccountId, Entry<Vec<Budget>>>,
}

/// Mutex-guarded TTL cache
pub struct MemoryCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl MemoryCache {
    /// Create a cache whose entries live for `ttl`
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Create a cache timed by the system clock
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> CacheResult<usize> {
        let now = self.clock.now();
        let mut state = self.lock()?;

        let before = state.len();
        state.reports.retain(|_, e| e.is_live(now));
        state.summaries.retain(|_, e| e.is_live(now));
        state.budget_lists.retain(|_, e| e.is_live(now));
        let purged = before - state.len();

        if purged > 0 {
            debug!(purged, "purged expired cache entries");
        }
        Ok(purged)
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> CacheResult<usize> {
        Ok(self.lock()?.len())
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, CacheState>> {
        self.state
            .lock()
            .map_err(|e| CacheError::Backend(format!("cache lock poisoned: {}", e)))
    }

    fn entry<T>(&self, value: T) -> Entry<T> {
        Entry {
            value,
            expires_at: self.clock.now() + self.ttl,
        }
    }
}

impl CacheState {
    fn len(&self) -> usize {
        self.reports.len() + self.summaries.len() + self.budget_lists.len()
    }
}

/// Return a live entry, evicting it if it has expired
fn lookup<K, V>(map: &mut HashMap<K, Entry<V>>, key: &K, now: DateTime<Utc>) -> CacheResult<V>
where
    K: Eq + Hash,
    V: Clone,
{
    match map.get(key) {
        Some(entry) if entry.is_live(now) => Ok(entry.value.clone()),
        Some(_) => {
            map.remove(key);
            Err(CacheError::Miss)
        }
        None => Err(CacheError::Miss),
    }
}

impl AggregateCache for MemoryCache {
    fn get_report(&self, cancel: &CancelToken, id: &ReportId) -> CacheResult<Report> {
        CacheError::check(cancel)?;
        let now = self.clock.now();
        lookup(&mut self.lock()?.reports, id, now)
    }

    fn set_report(&self, cancel: &CancelToken, report: &Report) -> CacheResult<()> {
        CacheError::check(cancel)?;
        if report.id.is_empty() {
            return Ok(());
        }
        let entry = self.entry(report.clone());
        self.lock()?.reports.insert(report.id.clone(), entry);
        Ok(())
    }

    fn delete_report(&self, cancel: &CancelToken, id: &ReportId) -> CacheResult<()> {
        CacheError::check(cancel)?;
        self.lock()?.reports.remove(id);
        Ok(())
    }

    fn get_summary(&self, cancel: &CancelToken, key: &SummaryKey) -> CacheResult<ReportSummary> {
        CacheError::check(cancel)?;
        let now = self.clock.now();
        lookup(&mut self.lock()?.summaries, key, now)
    }

    fn set_summary(
        &self,
        cancel: &CancelToken,
        key: &SummaryKey,
        summary: &ReportSummary,
    ) -> CacheResult<()> {
        CacheError::check(cancel)?;
        let entry = self.entry(summary.clone());
        self.lock()?.summaries.insert(key.clone(), entry);
        Ok(())
    }

    fn delete_summaries(&self, cancel: &CancelToken, account_id: &AccountId) -> CacheResult<()> {
        CacheError::check(cancel)?;
        self.lock()?
            .summaries
            .retain(|key, _| &key.account_id != account_id);
        Ok(())
    }

    fn get_budget_list(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
    ) -> CacheResult<Vec<Budget>> {
        CacheError::check(cancel)?;
        let now = self.clock.now();
        lookup(&mut self.lock()?.budget_lists, account_id, now)
    }

    fn set_budget_list(
        &self,
        cancel: &CancelToken,
        account_id: &AccountId,
        budgets: &[Budget],
    ) -> CacheResult<()> {
        CacheError::check(cancel)?;
        let entry = self.entry(budgets.to_vec());
        self.lock()?.budget_lists.insert(account_id.clone(), entry);
        Ok(())
    }

    fn delete_budget_list(&self, cancel: &CancelToken, account_id: &AccountId) -> CacheResult<()> {
        CacheError::check(cancel)?;
        self.lock()?.budget_lists.remove(account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::Money;
    use chrono::TimeZone;

    fn create_test_cache() -> (Arc<FixedClock>, MemoryCache) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        ));
        let cache = MemoryCache::new(Duration::seconds(60), clock.clone());
        (clock, cache)
    }

    fn report(id: &str) -> Report {
        Report {
            id: ReportId::from(id),
            account_id: AccountId::from("acc-1"),
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

    fn summary_key(account: &str) -> SummaryKey {
        SummaryKey {
            account_id: AccountId::from(account),
            start: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap(),
            currency: None,
        }
    }

    fn summary() -> ReportSummary {
        ReportSummary {
            period_start: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            period_end: Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap(),
            currency: "USD".into(),
            total_income: Money::zero(),
            total_expense: Money::new(10.0),
            categories: Vec::new(),
        }
    }

    #[test]
    fn test_report_round_trip_and_delete() {
        let cancel = CancelToken::none();
        let (_clock, cache) = create_test_cache();
        let id = ReportId::from("rep-1");

        assert!(cache.get_report(cancel, &id).unwrap_err().is_miss());
        cache.set_report(cancel, &report("rep-1")).unwrap();
        assert_eq!(cache.get_report(cancel, &id).unwrap(), report("rep-1"));

        cache.delete_report(cancel, &id).unwrap();
        assert!(cache.get_report(cancel, &id).unwrap_err().is_miss());
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cancel = CancelToken::none();
        let (clock, cache) = create_test_cache();
        let account = AccountId::from("acc-1");
        cache.set_budget_list(cancel, &account, &[]).unwrap();

        clock.advance(Duration::seconds(59));
        assert!(cache.get_budget_list(cancel, &account).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(cache.get_budget_list(cancel, &account).unwrap_err().is_miss());
        // Lazy expiry removed it
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_purge_expired() {
        let cancel = CancelToken::none();
        let (clock, cache) = create_test_cache();
        cache.set_report(cancel, &report("rep-1")).unwrap();
        clock.advance(Duration::seconds(30));
        cache.set_summary(cancel, &summary_key("acc-1"), &summary()).unwrap();

        clock.advance(Duration::seconds(45));
        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.len().unwrap(), 1);
        assert!(cache.get_summary(cancel, &summary_key("acc-1")).is_ok());
    }

    #[test]
    fn test_delete_summaries_is_account_scoped() {
        let cancel = CancelToken::none();
        let (_clock, cache) = create_test_cache();
        cache.set_summary(cancel, &summary_key("acc-1"), &summary()).unwrap();
        cache.set_summary(cancel, &summary_key("acc-2"), &summary()).unwrap();

        cache.delete_summaries(cancel, &AccountId::from("acc-1")).unwrap();

        assert!(cache.get_summary(cancel, &summary_key("acc-1")).unwrap_err().is_miss());
        assert!(cache.get_summary(cancel, &summary_key("acc-2")).is_ok());
    }

    #[test]
    fn test_report_without_id_is_not_cached() {
        let (_clock, cache) = create_test_cache();
        cache.set_report(CancelToken::none(), &report("")).unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_cancelled_calls_leave_cache_untouched() {
        let (_clock, cache) = create_test_cache();
        let cancelled = CancelToken::new();
        cancelled.cancel();
        let id = ReportId::from("rep-1");

        assert!(cache.set_report(&cancelled, &report("rep-1")).unwrap_err().is_cancelled());
        assert!(cache.is_empty().unwrap());

        cache.set_report(CancelToken::none(), &report("rep-1")).unwrap();
        assert!(cache.get_report(&cancelled, &id).unwrap_err().is_cancelled());
        assert!(cache.delete_report(&cancelled, &id).unwrap_err().is_cancelled());
        assert!(cache.get_report(CancelToken::none(), &id).is_ok());
    }
}
