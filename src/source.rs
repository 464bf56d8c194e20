//! Schedule sources. The first row of raw data names the columns; every
//! following row is positional values. Ragged rows are normal: missing
//! cells resolve to empty strings and extra cells are ignored.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::SheetConfig;
use crate::error::ReminderError;
use crate::models::Record;

const FETCH_ATTEMPTS: usize = 3;
const FETCH_BACKOFF: Duration = Duration::from_secs(5);

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the current schedule. Zero rows is a valid outcome, not a
    /// fault; only an unreachable source is an error.
    async fn fetch(&self) -> Result<Vec<Record>, ReminderError>;
}

/// Google Sheets values API over HTTPS.
pub struct SheetSource {
    config: SheetConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetSource {
    pub fn new(config: SheetConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_values(&self) -> Result<Vec<Vec<String>>, String> {
        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
            self.config.spreadsheet_id, self.config.range
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| format!("sheets request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("sheets API error {status}: {text}"));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| format!("invalid sheets response: {e}"))?;
        Ok(range.values)
    }
}

#[async_trait]
impl RecordSource for SheetSource {
    async fn fetch(&self) -> Result<Vec<Record>, ReminderError> {
        let values = fetch_with_retries(|| self.fetch_values()).await?;
        let records = records_from_rows(values);
        info!(rows = records.len(), "schedule sheet loaded");
        Ok(records)
    }
}

/// Bounded retries with a fixed backoff around one raw fetch. Transient
/// upstream failures get another chance; once the attempts are spent the
/// run aborts with `SourceUnavailable`.
async fn fetch_with_retries<F, Fut>(mut fetch: F) -> Result<Vec<Vec<String>>, ReminderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<Vec<Vec<String>>, String>>,
{
    let mut last_error = String::new();

    for attempt in 1..=FETCH_ATTEMPTS {
        match fetch().await {
            Ok(values) => return Ok(values),
            Err(detail) => {
                warn!(attempt, "sheet fetch failed: {detail}");
                last_error = detail;
            }
        }

        if attempt < FETCH_ATTEMPTS {
            tokio::time::sleep(FETCH_BACKOFF).await;
        }
    }

    Err(ReminderError::SourceUnavailable(last_error))
}

/// Local CSV file with the same columns as the sheet. Used by preview and
/// offline runs; no retries since there is no network involved.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl RecordSource for CsvSource {
    async fn fetch(&self) -> Result<Vec<Record>, ReminderError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| {
                ReminderError::SourceUnavailable(format!(
                    "cannot open {}: {e}",
                    self.path.display()
                ))
            })?;

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| ReminderError::SourceUnavailable(format!("bad CSV header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = vec![header];
        for result in reader.records() {
            let row = result
                .map_err(|e| ReminderError::SourceUnavailable(format!("bad CSV row: {e}")))?;
            rows.push(row.iter().map(str::to_string).collect());
        }

        Ok(records_from_rows(rows))
    }
}

/// Column headers as they appear in the academy's sheets. Each record
/// field accepts the timetable name and, where the progress-report sheet
/// differs, that name too.
fn cell(header: &[String], row: &[String], names: &[&str]) -> String {
    for name in names {
        if let Some(index) = header.iter().position(|column| column == name) {
            if let Some(value) = row.get(index) {
                return value.clone();
            }
        }
    }
    String::new()
}

fn record_from_row(header: &[String], row: &[String], sheet_row: usize) -> Record {
    Record {
        row: sheet_row,
        contact_name: cell(header, row, &["Customer", "Student_Name"]),
        contact_address: cell(header, row, &["Phone", "Student_Email"]),
        course: cell(header, row, &["Course"]),
        session_time: cell(header, row, &["Session"]),
        reminder_date: cell(header, row, &["Reminder_Date", "Report_Date"]),
        message_body: cell(header, row, &["Message"]),
        zoom_link: cell(header, row, &["Zoom_link"]),
        meeting_id: cell(header, row, &["Meeting_ID"]),
        passcode: cell(header, row, &["Passcode"]),
        cognitive_goals: cell(header, row, &["Cognitive_Goals"]),
        teacher_comments: cell(header, row, &["Teacher's_Comments"]),
        general_comment: cell(header, row, &["General_Comment"]),
    }
}

pub fn records_from_rows(rows: Vec<Vec<String>>) -> Vec<Record> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    rows.enumerate()
        .map(|(index, row)| record_from_row(&header, &row, index + 2))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn timetable_header() -> Vec<String> {
        strings(&[
            "Customer",
            "Phone",
            "Course",
            "Session",
            "Reminder_Date",
            "Message",
            "Zoom_link",
        ])
    }

    #[test]
    fn maps_timetable_columns() {
        let rows = vec![
            timetable_header(),
            strings(&[
                "Ann",
                "+15551234567",
                "Math",
                "4:00 PM",
                "2024-05-01",
                "See you in class!",
                "https://zoom.us/j/123",
            ]),
        ];

        let records = records_from_rows(rows);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.row, 2);
        assert_eq!(record.contact_name, "Ann");
        assert_eq!(record.contact_address, "+15551234567");
        assert_eq!(record.course, "Math");
        assert_eq!(record.session_time, "4:00 PM");
        assert_eq!(record.reminder_date, "2024-05-01");
        assert_eq!(record.message_body, "See you in class!");
        assert_eq!(record.zoom_link, "https://zoom.us/j/123");
    }

    #[test]
    fn maps_progress_report_columns() {
        let rows = vec![
            strings(&[
                "Student_Name",
                "Student_Email",
                "Course",
                "Report_Date",
                "Cognitive_Goals",
                "Teacher's_Comments",
                "General_Comment",
            ]),
            strings(&[
                "Bo",
                "bo@example.com",
                "Chess",
                "2024-05-02",
                "Focus and planning",
                "Strong opening play",
                "Great semester",
            ]),
        ];

        let records = records_from_rows(rows);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.contact_name, "Bo");
        assert_eq!(record.contact_address, "bo@example.com");
        assert_eq!(record.reminder_date, "2024-05-02");
        assert_eq!(record.cognitive_goals, "Focus and planning");
        assert_eq!(record.teacher_comments, "Strong opening play");
        assert_eq!(record.general_comment, "Great semester");
    }

    #[test]
    fn short_row_resolves_missing_cells_to_empty() {
        let rows = vec![timetable_header(), strings(&["Ann", "+15551234567"])];

        let records = records_from_rows(rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contact_name, "Ann");
        assert_eq!(records[0].course, "");
        assert_eq!(records[0].reminder_date, "");
    }

    #[test]
    fn extra_cells_are_ignored() {
        let rows = vec![
            strings(&["Customer", "Phone"]),
            strings(&["Ann", "+15551234567", "left over", "more"]),
        ];

        let records = records_from_rows(rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contact_name, "Ann");
        assert_eq!(records[0].contact_address, "+15551234567");
    }

    #[test]
    fn empty_value_set_yields_no_records() {
        assert!(records_from_rows(Vec::new()).is_empty());
        assert!(records_from_rows(vec![timetable_header()]).is_empty());
    }

    #[tokio::test]
    async fn csv_source_reads_ragged_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Customer,Phone,Course,Session,Reminder_Date").unwrap();
        writeln!(file, "Ann,+15551234567,Math,4:00 PM,2024-05-01").unwrap();
        writeln!(file, "Bo,+15557654321").unwrap();
        drop(file);

        let records = CsvSource::new(path).fetch().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].course, "Math");
        assert_eq!(records[1].contact_name, "Bo");
        assert_eq!(records[1].reminder_date, "");
    }

    #[tokio::test]
    async fn fetch_retries_until_the_source_recovers() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        tokio::time::pause();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let values = fetch_with_retries(move || {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(format!("sheets API error 503 (attempt {attempt})"))
                } else {
                    Ok(vec![
                        vec!["Customer".to_string()],
                        vec!["Ann".to_string()],
                    ])
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(values.len(), 2);
    }

    #[tokio::test]
    async fn fetch_stops_after_three_failed_attempts() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        tokio::time::pause();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let error = fetch_with_retries(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<Vec<Vec<String>>, String>("quota exceeded".to_string())
            }
        })
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(matches!(
            error,
            ReminderError::SourceUnavailable(ref detail) if detail.contains("quota exceeded")
        ));
    }

    #[tokio::test]
    async fn missing_csv_file_is_source_unavailable() {
        let source = CsvSource::new(PathBuf::from("/nonexistent/schedule.csv"));
        let error = source.fetch().await.unwrap_err();
        assert!(matches!(error, ReminderError::SourceUnavailable(_)));
    }
}
