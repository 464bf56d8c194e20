use thiserror::Error;

use crate::models::Channel;

/// Faults that escape a pipeline stage. Only `SourceUnavailable` aborts a
/// run; `MissingField` skips the affected record. Transport failures never
/// appear here: notifiers fold them into `DeliveryResult`.
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("schedule source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("missing required field `{field}` for {channel} message")]
    MissingField {
        field: &'static str,
        channel: Channel,
    },
}
