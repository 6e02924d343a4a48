use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::error::ShipError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// A single formatted log line, ready to be shipped.
///
/// The line is tab-separated: `date \t time \t level \t trace_id \t content`,
/// with backslashes and newlines in `content` escaped so the record stays
/// on one line. Entries are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LogEntry {
    line: String,
}

/// Fields recovered from a [`LogEntry`] line, with content unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFields {
    pub date: String,
    pub time: String,
    pub level: String,
    pub trace_id: Option<String>,
    pub content: String,
}

impl LogEntry {
    /// Build an entry stamped with the current local date and time.
    pub fn new(level: &str, trace_id: Option<&str>, content: &str) -> Self {
        Self::with_timestamp(Local::now().naive_local(), level, trace_id, content)
    }

    /// Build an entry stamped with an explicit timestamp.
    pub fn with_timestamp(
        at: NaiveDateTime,
        level: &str,
        trace_id: Option<&str>,
        content: &str,
    ) -> Self {
        let line = format!(
            "{}\t{}\t{}\t{}\t{}",
            at.format(DATE_FORMAT),
            at.format(TIME_FORMAT),
            level,
            trace_id.unwrap_or(""),
            escape(content),
        );
        LogEntry { line }
    }

    /// The raw line as it goes over the wire.
    pub fn as_str(&self) -> &str {
        &self.line
    }

    pub fn into_line(self) -> String {
        self.line
    }

    /// Split the line back into its fields.
    pub fn fields(&self) -> Result<LogFields, ShipError> {
        parse_line(&self.line)
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}

/// Escape `\` as `\\` and newline as `\n`, in that order.
pub fn escape(content: &str) -> String {
    content.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Reverse [`escape`].
///
/// Scans left to right so that an escaped backslash followed by `n`
/// (`\\n`) is read as a backslash and a literal `n`, not as a newline.
/// Unknown escape sequences are kept verbatim.
pub fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parse a shipped line the way the collector does: at least five
/// tab-separated fields, empty trace id meaning none.
pub fn parse_line(line: &str) -> Result<LogFields, ShipError> {
    let mut parts = line.splitn(5, '\t');
    let (Some(date), Some(time), Some(level), Some(trace_id), Some(content)) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(ShipError::MalformedLine);
    };

    Ok(LogFields {
        date: date.to_string(),
        time: time.to_string(),
        level: level.to_string(),
        trace_id: (!trace_id.is_empty()).then(|| trace_id.to_string()),
        content: unescape(content),
    })
}
