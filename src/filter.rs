use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::models::Record;

/// The run date, computed once per invocation in UTC so deployments in
/// different time zones agree on "today".
pub fn run_date() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Normalize a raw date cell to `YYYY-MM-DD`. Sheet cells sometimes carry
/// a full ISO datetime; only the first 10 characters count, and they must
/// parse as a real calendar date.
pub fn normalize_date(raw: &str) -> Option<String> {
    let head: String = raw.trim().chars().take(10).collect();
    NaiveDate::parse_from_str(&head, "%Y-%m-%d").ok()?;
    Some(head)
}

/// Keep the records scheduled for `run_date`, preserving input order.
/// Unparseable dates exclude the record, never the run.
pub fn select(records: &[Record], run_date: &str) -> Vec<Record> {
    records
        .iter()
        .filter(|record| match normalize_date(&record.reminder_date) {
            Some(date) => date == run_date,
            None => {
                warn!(
                    row = record.row,
                    raw = %record.reminder_date,
                    "skipped: unparseable date"
                );
                false
            }
        })
        .cloned()
        .collect()
}
