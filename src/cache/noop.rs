//! Cache that stores nothing
//!
//! Used when caching is disabled in the settings: every read misses and
//! every write succeeds.

use crate::cancel::CancelToken;
use crate::models::{AccountId, Budget, Report, ReportId};
use crate::reports::ReportSummary;

use super::{AggregateCache, CacheError, CacheResult, SummaryKey};

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl AggregateCache for NoopCache {
    fn get_report(&self, cancel: &CancelToken, _id: &ReportId) -> CacheResult<Report> {
        CacheError::check(cancel)?;
        Err(CacheError::Miss)
    }

    fn set_report(&self, cancel: &CancelToken, _report: &Report) -> CacheResult<()> {
        CacheError::check(cancel)?;
        Ok(())
    }

    fn delete_report(&self, cancel: &CancelToken, _id: &ReportId) -> CacheResult<()> {
        CacheError::check(cancel)?;
        Ok(())
    }

    fn get_summary(&self, cancel: &CancelToken, _key: &SummaryKey) -> CacheResult<ReportSummary> {
        CacheError::check(cancel)?;
        Err(CacheError::Miss)
    }

    fn set_summary(
        &self,
        cancel: &CancelToken,
        _key: &SummaryKey,
        _summary: &ReportSummary,
    ) -> CacheResult<()> {
        CacheError::check(cancel)?;
        Ok(())
    }

    fn delete_summaries(&self, cancel: &CancelToken, _account_id: &AccountId) -> CacheResult<()> {
        CacheError::check(cancel)?;
        Ok(())
    }

    fn get_budget_list(
        &self,
        cancel: &CancelToken,
        _account_id: &AccountId,
    ) -> CacheResult<Vec<Budget>> {
        CacheError::check(cancel)?;
        Err(CacheError::Miss)
    }

    fn set_budget_list(
        &self,
        cancel: &CancelToken,
        _account_id: &AccountId,
        _budgets: &[Budget],
    ) -> CacheResult<()> {
        CacheError::check(cancel)?;
        Ok(())
    }

    fn delete_budget_list(&self, cancel: &CancelToken, _account_id: &AccountId) -> CacheResult<()> {
        CacheError::check(cancel)?;
        Ok(())
    }
}
