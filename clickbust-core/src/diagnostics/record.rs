//! Log records.

use serde::Serialize;

use super::error::ErrorContext;
use super::level::Level;

/// A single message delivered to log handlers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Severity of the message.
    pub level: Level,
    /// Dotted name of the logger the message was logged on.
    pub logger_name: String,
    /// The message text.
    pub message: String,
    /// Monotonic sequence number, unique per log manager.
    pub sequence: u64,
    /// Time the record was built (ms).
    pub timestamp_ms: u64,
    /// Failure attached to the message, if any.
    pub error: Option<ErrorContext>,
}

impl LogRecord {
    /// Formatted error summary, if an error was attached.
    #[must_use]
    pub fn exception_text(&self) -> Option<String> {
        self.error.as_ref().map(ErrorContext::summary)
    }

    /// One-line rendering: `[sequence] LEVEL logger: message`.
    #[must_use]
    pub fn to_line(&self) -> String {
        let name = if self.logger_name.is_empty() {
            "(root)"
        } else {
            &self.logger_name
        };
        format!(
            "[{}] {} {}: {}",
            self.sequence, self.level, name, self.message
        )
    }
}
