//! CSV export of transactions
//!
//! Writes the same six-column layout the importer reads, always with a
//! header row. Amounts use the shortest exact decimal form and timestamps
//! are RFC3339 in UTC, with a fraction only when the instant has one.

use std::io::Write;

use chrono::SecondsFormat;
use csv::{Terminator, WriterBuilder};

use crate::error::LedgerResult;
use crate::models::Transaction;

/// Header row of the transaction CSV layout
pub const TRANSACTION_CSV_HEADER: [&str; 6] = [
    "account_id",
    "amount",
    "currency",
    "category",
    "description",
    "occurred_at",
];

/// Export transactions to CSV
pub fn export_transactions_csv<W: Write>(
    transactions: &[Transaction],
    writer: W,
) -> LedgerResult<()> {
    let mut csv_writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(TRANSACTION_CSV_HEADER)?;

    for txn in transactions {
        let amount = txn.amount.to_string();
        let occurred_at = txn.occurred_at.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        csv_writer.write_record([
            txn.account_id.as_str(),
            amount.as_str(),
            txn.currency.as_str(),
            txn.category.as_str(),
            txn.description.as_str(),
            occurred_at.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, Money, TransactionId};
    use chrono::{TimeZone, Utc};

    fn txn(amount: f64, description: &str) -> Transaction {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        Transaction {
            id: TransactionId::generate(),
            account_id: AccountId::from("acc-1"),
            amount: Money::new(amount),
            currency: "USD".into(),
            category: "Salary".into(),
            description: description.into(),
            occurred_at: at,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_export_layout() {
        let mut buffer = Vec::new();
        export_transactions_csv(&[txn(1250.5, "January pay"), txn(-40.0, "fee")], &mut buffer)
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "account_id,amount,currency,category,description,occurred_at",
                "acc-1,1250.5,USD,Salary,January pay,2024-01-01T10:00:00Z",
                "acc-1,-40,USD,Salary,fee,2024-01-01T10:00:00Z",
            ]
        );
    }

    #[test]
    fn test_export_quotes_fields_with_commas() {
        let mut buffer = Vec::new();
        export_transactions_csv(&[txn(-3.25, "coffee, large")], &mut buffer).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("\"coffee, large\""));
    }

    #[test]
    fn test_export_keeps_subsecond_precision() {
        let mut precise = txn(-7.0, "snack");
        precise.occurred_at = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);

        let mut buffer = Vec::new();
        export_transactions_csv(&[precise.clone()], &mut buffer).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let row = output.lines().nth(1).unwrap();
        assert!(row.ends_with(",2024-05-03T12:00:00.250Z"), "{row}");

        let stamp = row.rsplit(',').next().unwrap();
        assert_eq!(
            crate::models::period::parse_rfc3339(stamp),
            Some(precise.occurred_at)
        );
    }

    #[test]
    fn test_export_empty_has_header_only() {
        let mut buffer = Vec::new();
        export_transactions_csv(&[], &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "account_id,amount,currency,category,description,occurred_at\n"
        );
    }
}
