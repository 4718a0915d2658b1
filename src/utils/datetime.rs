//! DateTime utilities for record timestamps
//!
//! Timestamps are stored as RFC 3339 text with nanosecond precision so a
//! value read back compares equal to the value that was written.

use chrono::{DateTime, SecondsFormat, Utc};

/// Type alias for DateTime<Utc> used throughout project_store
pub type RecordDateTime = DateTime<Utc>;

/// Helper trait for creating and persisting RecordDateTime instances
pub trait RecordDateTimeExt: Sized {
    /// Create a new datetime with the current UTC time
    fn record_now() -> Self;

    /// Text form written to timestamp columns
    fn to_storage(&self) -> String;

    /// Parse the text form written by [`RecordDateTimeExt::to_storage`]
    fn from_storage(text: &str) -> Result<Self, chrono::ParseError>;
}

impl RecordDateTimeExt for DateTime<Utc> {
    fn record_now() -> Self {
        Utc::now()
    }

    fn to_storage(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    fn from_storage(text: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(text).map(|parsed| parsed.with_timezone(&Utc))
    }
}

// Re-export chrono for convenience
pub use chrono;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_datetime_creation() {
        let now = RecordDateTime::record_now();
        let now_chrono = Utc::now();

        let diff = (now.timestamp() - now_chrono.timestamp()).abs();
        assert!(diff < 2, "Timestamps should be within 2 seconds");
    }

    #[test]
    fn test_storage_text_keeps_nanoseconds() {
        let now = RecordDateTime::record_now();
        let text = now.to_storage();
        let parsed = RecordDateTime::from_storage(&text).unwrap();
        assert_eq!(parsed, now);
        assert!(text.ends_with('Z'));
    }

    #[test]
    fn test_storage_text_rejects_garbage() {
        assert!(RecordDateTime::from_storage("yesterday").is_err());
    }
}
