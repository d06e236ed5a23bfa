//! CSV import parsing
//!
//! Turns the fixed six-column layout
//! `account_id,amount,currency,category,description,occurred_at` into
//! [`NewTransaction`] inputs. Committing the rows is the ledger service's job.

use csv::{ReaderBuilder, StringRecord};

use crate::error::{LedgerError, LedgerResult};
use crate::models::period::parse_rfc3339;
use crate::models::{AccountId, Money, NewTransaction};

/// Number of columns every row must have
pub const CSV_COLUMNS: usize = 6;

/// Read every record of a CSV document
///
/// A document the reader cannot tokenize fails as a whole, before any row
/// is committed. Rows may differ in length; [`parse_record`] checks it.
pub fn read_records(content: &[u8]) -> LedgerResult<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LedgerError::Validation(format!("read csv: {}", e)))
}

/// Parse one record into a transaction input
///
/// A non-empty `account_id` overrides the record's own account column.
pub fn parse_record(record: &StringRecord, account_id: &AccountId) -> LedgerResult<NewTransaction> {
    if record.len() != CSV_COLUMNS {
        return Err(LedgerError::Validation(format!(
            "expected {} columns, found {}",
            CSV_COLUMNS,
            record.len()
        )));
    }

    let field = |index: usize| record.get(index).unwrap_or_default();

    let amount = Money::parse(field(1))
        .map_err(|e| LedgerError::Validation(format!("parse amount: {}", e)))?;

    let occurred_at = parse_rfc3339(field(5)).ok_or_else(|| {
        LedgerError::Validation(format!("parse occurred_at: invalid RFC3339 '{}'", field(5)))
    })?;

    let account_id = if account_id.is_empty() {
        AccountId::new(field(0).trim())
    } else {
        account_id.clone()
    };

    let input = NewTransaction {
        id: None,
        account_id,
        amount,
        currency: field(2).to_string(),
        category: field(3).to_string(),
        description: field(4).to_string(),
        occurred_at: Some(occurred_at),
    };
    input.validate()?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_record() {
        let row = record(&["acc-9", "-12.5", "USD", "Food", "lunch, with tax", "2024-05-03T12:00:00Z"]);
        let input = parse_record(&row, &AccountId::from("acc-1")).unwrap();

        assert_eq!(input.account_id, AccountId::from("acc-1"));
        assert_eq!(input.amount, Money::new(-12.5));
        assert_eq!(input.description, "lunch, with tax");
        assert_eq!(
            input.occurred_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_row_account_used_without_override() {
        let row = record(&["acc-9", "10", "USD", "Gift", "", "2024-05-03T12:00:00Z"]);
        let input = parse_record(&row, &AccountId::default()).unwrap();
        assert_eq!(input.account_id, AccountId::from("acc-9"));
    }

    #[test]
    fn test_malformed_rows() {
        let account = AccountId::from("acc-1");

        let short = record(&["acc-1", "10", "USD", "Food", "2024-05-03T12:00:00Z"]);
        assert!(parse_record(&short, &account).unwrap_err().is_validation());

        let bad_amount = record(&["acc-1", "ten", "USD", "Food", "", "2024-05-03T12:00:00Z"]);
        let err = parse_record(&bad_amount, &account).unwrap_err();
        assert!(err.to_string().contains("parse amount"));

        let bad_time = record(&["acc-1", "10", "USD", "Food", "", "2024-05-03"]);
        let err = parse_record(&bad_time, &account).unwrap_err();
        assert!(err.to_string().contains("parse occurred_at"));

        let zero = record(&["acc-1", "0", "USD", "Food", "", "2024-05-03T12:00:00Z"]);
        assert!(parse_record(&zero, &account).unwrap_err().is_validation());
    }

    #[test]
    fn test_read_records_handles_quotes() {
        let content = b"acc-1,-1,USD,Food,\"a, b\",2024-05-03T12:00:00Z\nacc-1,2,USD,Gift,x,2024-05-04T12:00:00Z\n";
        let records = read_records(content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(4), Some("a, b"));
    }

    #[test]
    fn test_read_records_rejects_broken_document() {
        let content = b"acc-1,-1,USD,Food,ok,2024-05-03T12:00:00Z\nacc-1,\xff\xfe,USD,Food,x,2024-05-03T12:00:00Z\n";
        assert!(read_records(content).is_err());
    }
}
