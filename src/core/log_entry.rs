//! Log entry structure

use super::context::{self, Context};
use super::field::Field;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::Location;

/// Source location of the logging call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Caller {
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

/// One log event
///
/// Owned entries are what the async queue holds. Entries used on the logging
/// hot path come from the pool as [`PooledEntry`](super::pool::PooledEntry)
/// and are deep-copied with `clone()` before they cross a thread boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub fields: Vec<Field>,
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<Caller>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub trace_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            time: Utc::now(),
            ..Default::default()
        }
    }

    /// Build an entry from a context, message and fields
    ///
    /// Trace and span ids are pulled out of `ctx`; used by the per-level
    /// provider methods that bypass the logger.
    pub fn from_parts(level: LogLevel, ctx: &Context, message: &str, fields: &[Field]) -> Self {
        Self {
            level,
            message: message.to_string(),
            fields: fields.to_vec(),
            time: Utc::now(),
            caller: None,
            trace_id: context::trace_id(ctx).to_string(),
            span_id: context::span_id(ctx).to_string(),
            stack_trace: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// First field with the given key
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Clear contents while keeping allocated capacity
    pub(crate) fn reset(&mut self) {
        self.level = LogLevel::default();
        self.message.clear();
        self.fields.clear();
        self.caller = None;
        self.trace_id.clear();
        self.span_id.clear();
        self.stack_trace = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_extracts_ids() {
        let ctx = Context::new()
            .with_value("trace_id", "t-1")
            .with_value("spanId", "s-1");
        let entry = LogEntry::from_parts(LogLevel::Warn, &ctx, "hello", &[Field::new("k", 1)]);

        assert_eq!(entry.trace_id, "t-1");
        assert_eq!(entry.span_id, "s-1");
        assert_eq!(entry.fields.len(), 1);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut entry = LogEntry::new(LogLevel::Error, "boom")
            .with_field(Field::new("a", 1))
            .with_field(Field::new("b", 2));
        entry.stack_trace = Some("trace".to_string());
        let capacity = entry.fields.capacity();

        entry.reset();

        assert!(entry.fields.is_empty());
        assert!(entry.message.is_empty());
        assert!(entry.stack_trace.is_none());
        assert_eq!(entry.fields.capacity(), capacity);
    }

    #[test]
    fn test_clone_does_not_share_fields() {
        let original = LogEntry::new(LogLevel::Info, "m").with_field(Field::new("a", 1));
        let mut copy = original.clone();
        copy.fields.push(Field::new("b", 2));

        assert_eq!(original.fields.len(), 1);
        assert_ne!(original.fields.as_ptr(), copy.fields.as_ptr());
    }

    #[test]
    fn test_caller_from_location() {
        let caller = Caller::from_location(Location::caller());
        assert!(caller.line > 0);
        assert!(!caller.file.is_empty());
    }
}
