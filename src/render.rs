//! Per-channel message rendering. Pure functions of the record: no I/O,
//! deterministic output for identical input.

use std::fmt::Write;

use crate::error::ReminderError;
use crate::models::{Channel, MessageBody, Record};

pub const EMAIL_SUBJECT: &str = "Student Progress Report";
pub const ACADEMY_NAME: &str = "New Dimension Academy";
pub const ACADEMY_PHONE: &str = "+1 437 967 5082";
pub const ACADEMY_SITE: &str = "www.ndacademy.ca";
pub const ACADEMY_TAGLINE: &str = "_Expanding Minds, Unlocking New Dimensions_";

pub fn render(record: &Record, channel: Channel) -> Result<MessageBody, ReminderError> {
    match channel {
        Channel::Email => render_email(record),
        Channel::Sms => render_sms(record),
        Channel::Whatsapp => render_whatsapp_text(record),
        Channel::WhatsappTemplate => render_whatsapp_template(record),
    }
}

fn require<'a>(
    value: &'a str,
    field: &'static str,
    channel: Channel,
) -> Result<&'a str, ReminderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ReminderError::MissingField { field, channel })
    } else {
        Ok(trimmed)
    }
}

fn render_sms(record: &Record) -> Result<MessageBody, ReminderError> {
    let name = require(&record.contact_name, "contact_name", Channel::Sms)?;
    let course = require(&record.course, "course", Channel::Sms)?;
    let session = require(&record.session_time, "session_time", Channel::Sms)?;

    let text = format!(
        "Hello {name},\n\
         You have a class today.\n\
         Course: {course}\n\
         Time: {session}\n\
         Let's learn and have fun!\n\
         {ACADEMY_NAME}"
    );
    Ok(MessageBody::Text(text))
}

fn render_whatsapp_text(record: &Record) -> Result<MessageBody, ReminderError> {
    let name = require(&record.contact_name, "contact_name", Channel::Whatsapp)?;

    let text = format!(
        "*Class Reminder - {ACADEMY_NAME}*\n\
         \n\
         Dear {name},\n\
         \n\
         {message}\n\
         \n\
         *Date:* {date}\n\
         *Course:* {course}\n\
         *Time:* {session}\n\
         \n\
         *Zoom Link:*\n\
         {zoom}\n\
         \n\
         Warm regards,\n\
         *{ACADEMY_NAME}*\n\
         {ACADEMY_PHONE}\n\
         {ACADEMY_SITE}\n\
         \n\
         {ACADEMY_TAGLINE}",
        message = record.message_body.trim(),
        date = record.reminder_date.trim(),
        course = record.course.trim(),
        session = record.session_time.trim(),
        zoom = record.zoom_link.trim(),
    );
    Ok(MessageBody::Text(text))
}

/// The structured class-reminder template takes five positional body
/// parameters. Every one is required; an approved template with an empty
/// parameter is rejected by the API, so catch it here instead. The
/// template's name and language live in the notifier's configuration.
fn render_whatsapp_template(record: &Record) -> Result<MessageBody, ReminderError> {
    let channel = Channel::WhatsappTemplate;
    let parameters = vec![
        require(&record.contact_name, "contact_name", channel)?.to_string(),
        require(&record.course, "course", channel)?.to_string(),
        require(&record.session_time, "session_time", channel)?.to_string(),
        require(&record.reminder_date, "reminder_date", channel)?.to_string(),
        require(&record.zoom_link, "zoom_link", channel)?.to_string(),
    ];

    Ok(MessageBody::Template { parameters })
}

fn render_email(record: &Record) -> Result<MessageBody, ReminderError> {
    let name = require(&record.contact_name, "contact_name", Channel::Email)?;

    let mut html = String::new();
    let _ = writeln!(
        html,
        "<html><body style=\"margin:0;padding:0;background:#f4f4f4;font-family:Arial,sans-serif\">"
    );
    let _ = writeln!(
        html,
        "<table width=\"600\" align=\"center\" style=\"background:#ffffff;border-collapse:collapse\">"
    );

    let _ = writeln!(html, "<tr><td style=\"padding:20px\">");
    let _ = writeln!(html, "<h2>Progress Report</h2>");
    let _ = writeln!(
        html,
        "<p><strong>Student:</strong> {}</p>",
        escape_html(name)
    );
    let _ = writeln!(
        html,
        "<p><strong>Course:</strong> {}</p>",
        escape_html(record.course.trim())
    );
    let _ = writeln!(html, "</td></tr>");

    for (label, value) in [
        ("Cognitive Goals", &record.cognitive_goals),
        ("Teacher Comments", &record.teacher_comments),
        ("General Comment", &record.general_comment),
    ] {
        let _ = writeln!(
            html,
            "<tr><td style=\"padding:20px\"><strong>{label}</strong><br>{}</td></tr>",
            escape_html(value.trim())
        );
    }

    let _ = writeln!(
        html,
        "<tr><td style=\"padding:20px\">{ACADEMY_NAME} &middot; {ACADEMY_PHONE} &middot; {ACADEMY_SITE}</td></tr>"
    );
    let _ = writeln!(html, "</table></body></html>");

    Ok(MessageBody::Html {
        subject: EMAIL_SUBJECT.to_string(),
        html,
    })
}

/// Sheet cells are untrusted free text; neutralize anything that could
/// break the markup structure.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
