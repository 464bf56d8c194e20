use std::fmt;

use clap::ValueEnum;

/// One row of the schedule sheet, normalized to named fields.
/// Cells absent from a row resolve to empty strings; nothing is ever
/// written back to the source.
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// 1-based sheet row, kept for log context.
    pub row: usize,
    pub contact_name: String,
    pub contact_address: String,
    pub course: String,
    pub session_time: String,
    /// Raw date cell; normalized by the filter, not here.
    pub reminder_date: String,
    pub message_body: String,
    pub zoom_link: String,
    pub meeting_id: String,
    pub passcode: String,
    pub cognitive_goals: String,
    pub teacher_comments: String,
    pub general_comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Channel {
    Email,
    Sms,
    Whatsapp,
    WhatsappTemplate,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Whatsapp => "whatsapp",
            Channel::WhatsappTemplate => "whatsapp-template",
        };
        f.write_str(name)
    }
}

/// Rendered message, ready for exactly one transport. The template
/// variant carries only the positional body parameters; which approved
/// template they fill is transport configuration, not record data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Html {
        subject: String,
        html: String,
    },
    Template {
        parameters: Vec<String>,
    },
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageBody::Text(text) => f.write_str(text),
            MessageBody::Html { subject, html } => {
                writeln!(f, "Subject: {subject}")?;
                f.write_str(html)
            }
            MessageBody::Template { parameters } => {
                writeln!(f, "Template parameters:")?;
                for (index, parameter) in parameters.iter().enumerate() {
                    writeln!(f, "  {{{{{}}}}} = {parameter}", index + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Outcome of one delivery attempt. Append-only within a run; never
/// persisted across runs.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub destination: String,
    pub succeeded: bool,
    pub detail: Option<String>,
}

impl DeliveryResult {
    pub fn sent(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            succeeded: true,
            detail: None,
        }
    }

    pub fn failed(destination: &str, detail: impl Into<String>) -> Self {
        Self {
            destination: destination.to_string(),
            succeeded: false,
            detail: Some(detail.into()),
        }
    }
}

/// Aggregate of one pipeline execution.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_date: String,
    pub total_rows: usize,
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<DeliveryResult>,
}

impl RunReport {
    pub fn new(run_date: &str, total_rows: usize) -> Self {
        Self {
            run_date: run_date.to_string(),
            total_rows,
            matched: 0,
            sent: 0,
            failed: 0,
            skipped: 0,
            results: Vec::new(),
        }
    }

    /// Record the outcome of a send attempt.
    pub fn record(&mut self, result: DeliveryResult) {
        if result.succeeded {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// Record a reminder skipped before any send attempt was made.
    pub fn record_skipped(&mut self, destination: &str, reason: String) {
        self.skipped += 1;
        self.results.push(DeliveryResult::failed(
            destination,
            format!("skipped: {reason}"),
        ));
    }
}
