//! Markdown rendering of a single log entry.
//!
//! Each entry is a level-1 heading followed by a fenced code block holding
//! the pretty-printed record:
//!
//! ````text
//! # 2024/01/15 10:30:00 未解決
//!
//! ```javascript
//! {
//!   "level": "error"
//! }
//! ```
//!
//! ````

use crate::error::MdlogError;
use crate::record::LogRecord;
use crate::timestamp;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

/// Name of the single log file inside the configured directory.
pub const LOG_FILE_NAME: &str = "error_log.md";

/// Fixed status marker appended to every title ("unresolved").
pub const UNRESOLVED_MARKER: &str = "未解決";

/// Language tag of the fenced body.
pub const CODE_FENCE_LANG: &str = "javascript";

/// A rendered title + body pair, ready to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    title: String,
    body: String,
}

impl LogEntry {
    /// Build an entry, formatting times in the process-local zone.
    pub fn from_record(record: &LogRecord, received_at: DateTime<Utc>) -> Result<Self, MdlogError> {
        Self::from_record_in(record, received_at, &Local)
    }

    pub fn from_record_in<Tz>(
        record: &LogRecord,
        received_at: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Self, MdlogError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let effective = timestamp::resolve(record.timestamp(), received_at, tz);
        let title = format!(
            "{} {}",
            timestamp::format_title_timestamp(&effective, tz),
            UNRESOLVED_MARKER
        );
        let body = record.to_pretty_json()?;
        Ok(Self { title, body })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The exact bytes appended to the log file.
    pub fn render(&self) -> String {
        format!(
            "# {}\n\n```{}\n{}\n```\n\n",
            self.title, CODE_FENCE_LANG, self.body
        )
    }
}
