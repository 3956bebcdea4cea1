//! Response structures for listing and stats

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::Transaction;
use crate::types::{GroupBy, TransactionType};

/// Pagination metadata for a list page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

/// One page of records
#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

impl TransactionPage {
    /// Order records newest first and cut out the requested page
    pub fn from_records(mut records: Vec<Transaction>, page: usize, limit: usize) -> Self {
        sort_newest_first(&mut records);

        let total = records.len();
        let transactions = records
            .into_iter()
            .skip(fintrack_utils::page_offset(page, limit))
            .take(limit)
            .collect();

        Self {
            transactions,
            pagination: Pagination {
                total,
                page,
                pages: fintrack_utils::page_count(total, limit),
            },
        }
    }
}

/// `date` descending, then `createdAt` descending. The id breaks any
/// remaining tie so that pages never overlap.
pub fn sort_newest_first(records: &mut [Transaction]) {
    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Aggregate of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsGroup {
    pub key: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub count: usize,
}

/// Income/expense totals over the same filtered set as the groups
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub groups: Vec<StatsGroup>,
    pub summary: StatsSummary,
}

impl StatsReport {
    pub fn build(records: &[Transaction], group_by: GroupBy) -> Self {
        let mut totals: HashMap<String, (Decimal, usize)> = HashMap::new();
        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;

        for record in records {
            let key = match group_by {
                GroupBy::Category => record.kind.category().label().to_string(),
                GroupBy::Month => fintrack_utils::month_key(&record.date),
            };
            let entry = totals.entry(key).or_insert((Decimal::ZERO, 0));
            entry.0 += record.amount;
            entry.1 += 1;

            match record.transaction_type() {
                TransactionType::Income => total_income += record.amount,
                TransactionType::Expense => total_expense += record.amount,
            }
        }

        let mut groups: Vec<StatsGroup> = totals
            .into_iter()
            .map(|(key, (total_amount, count))| StatsGroup { key, total_amount, count })
            .collect();
        groups.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| a.key.cmp(&b.key))
        });

        Self {
            groups,
            summary: StatsSummary {
                total_income,
                total_expense,
                net: total_income - total_expense,
                count: records.len(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTransaction, Recurrence, TransactionKind};
    use crate::types::{ExpenseCategory, IncomeCategory};
    use chrono::{Duration, NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn record(kind: TransactionKind, amount: Decimal, date: (i32, u32, u32)) -> Transaction {
        Transaction::new(
            "alice",
            NewTransaction {
                kind,
                amount,
                description: String::new(),
                date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
                tags: BTreeSet::new(),
                recurrence: Recurrence::OneOff,
            },
            Utc::now(),
        )
    }

    fn expense(category: ExpenseCategory, amount: Decimal, date: (i32, u32, u32)) -> Transaction {
        record(TransactionKind::Expense { category, payment_method: None }, amount, date)
    }

    fn income(amount: Decimal, date: (i32, u32, u32)) -> Transaction {
        record(
            TransactionKind::Income { category: IncomeCategory::Salary, source: None },
            amount,
            date,
        )
    }

    #[test]
    fn test_empty_stats() {
        let report = StatsReport::build(&[], GroupBy::Category);
        assert!(report.groups.is_empty());
        assert_eq!(report.summary.count, 0);
        assert_eq!(report.summary.net, Decimal::ZERO);
    }

    #[test]
    fn test_group_by_category_sorted_by_total() {
        let records = vec![
            expense(ExpenseCategory::Groceries, dec!(20), (2024, 1, 3)),
            expense(ExpenseCategory::Rent, dec!(900), (2024, 1, 1)),
            expense(ExpenseCategory::Groceries, dec!(35.5), (2024, 1, 9)),
            income(dec!(3000), (2024, 1, 31)),
        ];
        let report = StatsReport::build(&records, GroupBy::Category);

        let keys: Vec<&str> = report.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Salary", "Rent", "Groceries"]);
        assert_eq!(report.groups[2].total_amount, dec!(55.5));
        assert_eq!(report.groups[2].count, 2);

        assert_eq!(report.summary.total_income, dec!(3000));
        assert_eq!(report.summary.total_expense, dec!(955.5));
        assert_eq!(report.summary.net, dec!(2044.5));
        assert_eq!(report.summary.count, 4);
    }

    #[test]
    fn test_group_by_month_ties_by_key() {
        let records = vec![
            expense(ExpenseCategory::Travel, dec!(10), (2024, 2, 1)),
            expense(ExpenseCategory::Travel, dec!(10), (2024, 1, 1)),
        ];
        let report = StatsReport::build(&records, GroupBy::Month);
        let keys: Vec<&str> = report.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-02"]);
    }

    #[test]
    fn test_pages_cover_every_record_once() {
        let now = Utc::now();
        let mut records = Vec::new();
        for i in 0..25u32 {
            let mut r = income(dec!(1), (2024, 1, 1 + i % 5));
            r.created_at = now + Duration::seconds(i as i64);
            records.push(r);
        }

        let mut seen = Vec::new();
        for page in 1..=3 {
            let result = TransactionPage::from_records(records.clone(), page, 10);
            assert_eq!(result.pagination, Pagination { total: 25, page, pages: 3 });
            seen.extend(result.transactions);
        }

        assert_eq!(seen.len(), 25);
        let mut ids: Vec<_> = seen.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 25);

        let mut expected = records;
        sort_newest_first(&mut expected);
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_sort_date_then_created_at() {
        let now = Utc::now();
        let mut older = income(dec!(1), (2024, 1, 1));
        older.created_at = now;
        let mut newer_same_day = income(dec!(1), (2024, 1, 1));
        newer_same_day.created_at = now + Duration::seconds(5);
        let later_day = income(dec!(1), (2024, 1, 2));

        let mut records = vec![older.clone(), later_day.clone(), newer_same_day.clone()];
        sort_newest_first(&mut records);
        assert_eq!(records, vec![later_day, newer_same_day, older]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let records = vec![income(dec!(1), (2024, 1, 1))];
        let page = TransactionPage::from_records(records, 4, 10);
        assert!(page.transactions.is_empty());
        assert_eq!(page.pagination, Pagination { total: 1, page: 4, pages: 1 });
    }
}
