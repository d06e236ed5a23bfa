//! Income/expense summary with prorated budgets
//!
//! [`build_summary`] is a pure function over already-loaded transactions and
//! budgets. It does no I/O, so reports, live summaries and tests all share it.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::period::days_in_month;
use crate::models::{Budget, Money, ReportCategory, ReportPeriod, Transaction};

/// Aggregate figures for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Filter currency, or the currency of the first contributing transaction
    pub currency: String,
    pub total_income: Money,
    pub total_expense: Money,
    /// One line per category with expense, sorted by category label
    pub categories: Vec<ReportCategory>,
}

/// Build the summary for `period`
///
/// Only transactions inside the period (bounds included) and, when
/// `currency` is given, in that currency contribute. Categories are visited
/// in lexicographic order; each one's budget is the prorated sum of every
/// budget for that category whose month overlaps the period.
pub fn build_summary(
    transactions: &[Transaction],
    budgets: &[Budget],
    period: &ReportPeriod,
    currency: Option<&str>,
) -> ReportSummary {
    let currency = currency.map(str::trim).filter(|c| !c.is_empty());

    let mut contributing: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| period.contains(t.occurred_at))
        .filter(|t| currency.map_or(true, |c| t.currency == c))
        .collect();
    contributing.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then(a.occurred_at.cmp(&b.occurred_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let resolved_currency = currency
        .map(str::to_string)
        .or_else(|| contributing.first().map(|t| t.currency.clone()))
        .unwrap_or_default();

    let mut total_income = Money::zero();
    let mut total_expense = Money::zero();
    let mut by_category: BTreeMap<&str, Money> = BTreeMap::new();

    for txn in contributing {
        if txn.is_expense() {
            let expense = txn.amount.abs();
            total_expense += expense;
            *by_category.entry(txn.category.as_str()).or_default() += expense;
        } else {
            total_income += txn.amount;
        }
    }

    let categories = by_category
        .into_iter()
        .map(|(category, expense)| {
            let budget_amount = prorated_budget(budgets, category, &resolved_currency, period);
            ReportCategory {
                category: category.to_string(),
                total_expense: expense,
                budget_amount,
                budget_usage_percent: usage_percent(expense, budget_amount),
            }
        })
        .collect();

    ReportSummary {
        period_start: period.start(),
        period_end: period.end(),
        currency: resolved_currency,
        total_income,
        total_expense,
        categories,
    }
}

/// Budget available to `category` over `period`
///
/// Each overlapping monthly budget contributes
/// `amount * overlap_days / days_in_month`, counting both boundary days.
/// An empty `currency` matches budgets in any currency.
pub fn prorated_budget(
    budgets: &[Budget],
    category: &str,
    currency: &str,
    period: &ReportPeriod,
) -> Money {
    budgets
        .iter()
        .filter(|b| b.name == category)
        .filter(|b| currency.is_empty() || b.currency == currency)
        .filter_map(|b| {
            let overlap = period.overlap_days_with_month(b.month);
            let month_days = days_in_month(b.month.year(), b.month.month());
            if overlap <= 0 || month_days == 0 {
                return None;
            }
            Some(Money::new(
                b.amount.value() * (overlap as f64 / f64::from(month_days)),
            ))
        })
        .sum()
}

/// `expense / budget * 100`, absent when there is no budget to measure against
pub fn usage_percent(expense: Money, budget: Money) -> Option<f64> {
    if budget.is_positive() {
        Some(expense.value() / budget.value() * 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, BudgetCadence, BudgetId, TransactionId};
    use chrono::TimeZone;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
    }

    fn txn(id: &str, amount: f64, currency: &str, category: &str, when: DateTime<Utc>) -> Transaction {
        Transaction {
            id: TransactionId::from(id),
            account_id: AccountId::from("acc-1"),
            amount: Money::new(amount),
            currency: currency.into(),
            category: category.into(),
            description: String::new(),
            occurred_at: when,
            created_at: when,
            updated_at: when,
        }
    }

    fn budget(name: &str, amount: f64, currency: &str, month: u32) -> Budget {
        let first = Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap();
        Budget {
            id: BudgetId::generate(),
            account_id: AccountId::from("acc-1"),
            name: name.into(),
            amount: Money::new(amount),
            currency: currency.into(),
            cadence: BudgetCadence::Monthly,
            month: first,
            created_at: first,
            updated_at: first,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_full_month_usage() {
        let transactions = vec![
            txn("t-1", -40.0, "USD", "Food", at(5, 3)),
            txn("t-2", -50.0, "USD", "Food", at(5, 20)),
            txn("t-3", 1000.0, "USD", "Salary", at(5, 1)),
        ];
        let budgets = vec![budget("Food", 100.0, "USD", 5)];
        let period = ReportPeriod::parse("2024-05").unwrap();

        let summary = build_summary(&transactions, &budgets, &period, None);

        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.total_income, Money::new(1000.0));
        assert_eq!(summary.total_expense, Money::new(90.0));
        assert_eq!(summary.categories.len(), 1);

        let food = &summary.categories[0];
        assert_eq!(food.category, "Food");
        assert_eq!(food.total_expense, Money::new(90.0));
        assert_eq!(food.budget_amount, Money::new(100.0));
        assert!(approx(food.budget_usage_percent.unwrap(), 90.0));
    }

    #[test]
    fn test_half_month_proration() {
        let transactions = vec![txn("t-1", -40.0, "USD", "Food", at(5, 3))];
        let budgets = vec![budget("Food", 100.0, "USD", 5)];
        let period = ReportPeriod::parse("2024-05-01/2024-05-15").unwrap();

        let summary = build_summary(&transactions, &budgets, &period, None);
        let food = &summary.categories[0];

        assert!(approx(food.budget_amount.value(), 100.0 * 15.0 / 31.0));
        assert!((food.budget_amount.value() - 48.39).abs() < 0.01);
    }

    #[test]
    fn test_proration_spans_months() {
        let transactions = vec![txn("t-1", -10.0, "USD", "Food", at(5, 31))];
        let budgets = vec![
            budget("Food", 310.0, "USD", 5),
            budget("Food", 300.0, "USD", 6),
            budget("Food", 999.0, "USD", 8),
        ];
        let period = ReportPeriod::parse("2024-05-22/2024-06-10").unwrap();

        let summary = build_summary(&transactions, &budgets, &period, None);
        // 10 days of May at 10/day plus 10 days of June at 10/day
        assert!(approx(summary.categories[0].budget_amount.value(), 200.0));
    }

    #[test]
    fn test_no_budget_leaves_percent_absent() {
        let transactions = vec![txn("t-1", -15.0, "USD", "Travel", at(5, 3))];
        let period = ReportPeriod::parse("2024-05").unwrap();

        let summary = build_summary(&transactions, &[], &period, None);
        let travel = &summary.categories[0];
        assert_eq!(travel.budget_amount, Money::zero());
        assert_eq!(travel.budget_usage_percent, None);
    }

    #[test]
    fn test_currency_filter_and_resolution() {
        let transactions = vec![
            txn("t-1", -10.0, "EUR", "Books", at(5, 2)),
            txn("t-2", -20.0, "USD", "Food", at(5, 1)),
            txn("t-3", -5.0, "USD", "Books", at(5, 9)),
        ];
        let budgets = vec![budget("Books", 50.0, "USD", 5), budget("Books", 40.0, "EUR", 5)];
        let period = ReportPeriod::parse("2024-05").unwrap();

        // First contributing transaction in category order is the EUR book
        let unfiltered = build_summary(&transactions, &budgets, &period, None);
        assert_eq!(unfiltered.currency, "EUR");
        assert_eq!(unfiltered.total_expense, Money::new(35.0));

        let usd = build_summary(&transactions, &budgets, &period, Some("USD"));
        assert_eq!(usd.currency, "USD");
        assert_eq!(usd.total_expense, Money::new(25.0));
        let books = usd.categories.iter().find(|c| c.category == "Books").unwrap();
        assert_eq!(books.budget_amount, Money::new(50.0));
        assert!(approx(books.budget_usage_percent.unwrap(), 10.0));
    }

    #[test]
    fn test_period_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let transactions = vec![
            txn("t-1", -1.0, "USD", "Food", start),
            txn("t-2", -2.0, "USD", "Food", end),
            txn("t-3", -4.0, "USD", "Food", end + chrono::Duration::seconds(1)),
        ];
        let period = ReportPeriod::new(start, end).unwrap();

        let summary = build_summary(&transactions, &[], &period, None);
        assert_eq!(summary.total_expense, Money::new(3.0));
    }

    #[test]
    fn test_categories_sorted_and_income_excluded() {
        let transactions = vec![
            txn("t-1", -1.0, "USD", "Zoo", at(5, 3)),
            txn("t-2", -2.0, "USD", "Art", at(5, 4)),
            txn("t-3", 3.0, "USD", "Gift", at(5, 5)),
        ];
        let period = ReportPeriod::parse("2024-05").unwrap();

        let summary = build_summary(&transactions, &[], &period, None);
        let names: Vec<_> = summary.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Art", "Zoo"]);
        assert_eq!(summary.total_income, Money::new(3.0));
    }

    #[test]
    fn test_empty_period() {
        let period = ReportPeriod::parse("2024-05").unwrap();
        let summary = build_summary(&[], &[], &period, None);
        assert_eq!(summary.currency, "");
        assert!(summary.categories.is_empty());
        assert!(summary.total_expense.is_zero());
    }
}
