use tracing::{info, warn};

use crate::error::ReminderError;
use crate::filter;
use crate::models::RunReport;
use crate::notify::Notifier;
use crate::render;
use crate::source::RecordSource;

/// One batch run: fetch the schedule, keep today's rows, then render and
/// deliver each one independently. Only a failed fetch aborts; everything
/// after it is best effort per record.
pub struct ReminderPipeline<'a> {
    source: &'a dyn RecordSource,
    notifier: &'a dyn Notifier,
}

impl<'a> ReminderPipeline<'a> {
    pub fn new(source: &'a dyn RecordSource, notifier: &'a dyn Notifier) -> Self {
        Self { source, notifier }
    }

    pub async fn run(&self, run_date: &str) -> Result<RunReport, ReminderError> {
        let records = self.source.fetch().await?;

        let matched = filter::select(&records, run_date);
        info!(
            run_date,
            rows = records.len(),
            matched = matched.len(),
            "processing reminders"
        );

        let mut report = RunReport::new(run_date, records.len());
        report.matched = matched.len();

        for record in &matched {
            let destination = record.contact_address.as_str();

            match render::render(record, self.notifier.channel()) {
                Ok(body) => {
                    let result = self.notifier.send(destination, &body).await;
                    match &result.detail {
                        None => info!(row = record.row, destination, "reminder sent"),
                        Some(detail) => {
                            warn!(row = record.row, destination, "delivery failed: {detail}")
                        }
                    }
                    report.record(result);
                }
                Err(error) => {
                    warn!(row = record.row, destination, "skipped: {error}");
                    report.record_skipped(destination, error.to_string());
                }
            }
        }

        Ok(report)
    }
}
