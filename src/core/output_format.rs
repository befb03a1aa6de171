//! Output formats for rendered entries
//!
//! - Text: `[2025-01-08T10:30:45.123Z] [INFO ] Request processed user=alice`
//! - Json: one object per line, fields in insertion order
//! - Logfmt: `timestamp=... level=INFO message="Request processed" user=alice`
//!
//! Text and logfmt escape `\n`, `\r` and `\t` in messages, keys and values so
//! a user-supplied string cannot forge extra log lines.

use super::error::{LoggerError, Result};
use super::field::{Field, FieldValue};
use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

/// Output format for log entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Logfmt,
}

impl OutputFormat {
    /// Append the rendered entry to `out`, without a trailing newline
    pub fn render(
        &self,
        entry: &LogEntry,
        timestamp_format: &TimestampFormat,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        match self {
            OutputFormat::Text => render_text(entry, timestamp_format, out),
            OutputFormat::Json => render_json(entry, timestamp_format, out),
            OutputFormat::Logfmt => render_logfmt(entry, timestamp_format, out),
        }
    }

    /// Render into a fresh string
    pub fn format(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        let mut out = Vec::with_capacity(256);
        match self.render(entry, timestamp_format, &mut out) {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(e) => format!("<unrenderable entry: {}>", e),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "logfmt" => Ok(OutputFormat::Logfmt),
            other => Err(LoggerError::config(
                "OutputFormat",
                format!("unknown format '{}', expected text, json or logfmt", other),
            )),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Copy `s` into `out`, replacing control characters that break lines
fn write_escaped(out: &mut Vec<u8>, s: &str) {
    for c in s.chars() {
        match c {
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c => {
                let mut utf8 = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
}

fn render_text(entry: &LogEntry, ts: &TimestampFormat, out: &mut Vec<u8>) -> Result<()> {
    render_text_with_label(
        entry,
        ts,
        format_args!("{:5}", entry.level.to_str()),
        out,
    )
}

/// Text layout with a caller-supplied level label (the console colors it)
pub(crate) fn render_text_with_label(
    entry: &LogEntry,
    ts: &TimestampFormat,
    label: impl std::fmt::Display,
    out: &mut Vec<u8>,
) -> Result<()> {
    out.push(b'[');
    ts.write(&entry.time, out)?;
    write!(out, "] [{}] ", label)?;
    write_escaped(out, &entry.message);

    for field in &entry.fields {
        out.push(b' ');
        write_escaped(out, &field.key);
        out.push(b'=');
        write_escaped(out, &field.value.to_string());
    }
    if !entry.trace_id.is_empty() {
        out.extend_from_slice(b" trace_id=");
        write_escaped(out, &entry.trace_id);
    }
    if !entry.span_id.is_empty() {
        out.extend_from_slice(b" span_id=");
        write_escaped(out, &entry.span_id);
    }
    if let Some(caller) = &entry.caller {
        write!(out, " caller={}:{}", caller.file, caller.line)?;
    }
    // The stack trace is ours, not user input, so it keeps its line breaks
    if let Some(stack) = &entry.stack_trace {
        out.push(b'\n');
        out.extend_from_slice(stack.trim_end().as_bytes());
    }
    Ok(())
}

/// Serializes an entry as a flat JSON object
///
/// Goes through `SerializeMap` directly instead of a `serde_json::Map` so
/// fields keep their order and repeated keys are all written.
struct JsonRecord<'a> {
    entry: &'a LogEntry,
    timestamp_format: &'a TimestampFormat,
}

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let entry = self.entry;
        let mut map = serializer.serialize_map(None)?;

        match self.timestamp_format.epoch_value(&entry.time) {
            Some(epoch) => map.serialize_entry("timestamp", &epoch)?,
            None => map.serialize_entry("timestamp", &self.timestamp_format.format(&entry.time))?,
        }
        map.serialize_entry("level", entry.level.to_str())?;
        map.serialize_entry("message", &entry.message)?;
        if !entry.trace_id.is_empty() {
            map.serialize_entry("trace_id", &entry.trace_id)?;
        }
        if !entry.span_id.is_empty() {
            map.serialize_entry("span_id", &entry.span_id)?;
        }
        if let Some(caller) = &entry.caller {
            map.serialize_entry("caller", &format!("{}:{}", caller.file, caller.line))?;
        }
        for Field { key, value } in &entry.fields {
            map.serialize_entry(key, value)?;
        }
        if let Some(stack) = &entry.stack_trace {
            map.serialize_entry("stack_trace", stack)?;
        }
        map.end()
    }
}

fn render_json(entry: &LogEntry, ts: &TimestampFormat, out: &mut Vec<u8>) -> Result<()> {
    let record = JsonRecord {
        entry,
        timestamp_format: ts,
    };
    serde_json::to_writer(out, &record)?;
    Ok(())
}

fn render_logfmt(entry: &LogEntry, ts: &TimestampFormat, out: &mut Vec<u8>) -> Result<()> {
    out.extend_from_slice(b"timestamp=");
    let stamp = ts.format(&entry.time);
    write_logfmt_value(out, &stamp);
    write!(out, " level={} message=", entry.level.to_str())?;
    write_quoted(out, &entry.message);

    if !entry.trace_id.is_empty() {
        out.extend_from_slice(b" trace_id=");
        write_logfmt_value(out, &entry.trace_id);
    }
    if !entry.span_id.is_empty() {
        out.extend_from_slice(b" span_id=");
        write_logfmt_value(out, &entry.span_id);
    }
    if let Some(caller) = &entry.caller {
        out.extend_from_slice(b" caller=");
        write_logfmt_value(out, &format!("{}:{}", caller.file, caller.line));
    }
    for field in &entry.fields {
        out.push(b' ');
        write_logfmt_key(out, &field.key);
        out.push(b'=');
        match &field.value {
            FieldValue::String(s) => write_logfmt_value(out, s),
            other => write!(out, "{}", other)?,
        }
    }
    if let Some(stack) = &entry.stack_trace {
        out.extend_from_slice(b" stack_trace=");
        write_quoted(out, stack);
    }
    Ok(())
}

/// Keys keep only alphanumerics, `_`, `-` and `.`
fn write_logfmt_key(out: &mut Vec<u8>, key: &str) {
    let before = out.len();
    for c in key.chars() {
        if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
            let mut utf8 = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
        }
    }
    if out.len() == before {
        out.push(b'_');
    }
}

fn write_logfmt_value(out: &mut Vec<u8>, value: &str) {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c == ' ' || c == '"' || c == '=' || c == '\\' || c.is_control());
    if needs_quotes {
        write_quoted(out, value);
    } else {
        out.extend_from_slice(value.as_bytes());
    }
}

fn write_quoted(out: &mut Vec<u8>, value: &str) {
    out.push(b'"');
    for c in value.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c => {
                let mut utf8 = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    out.push(b'"');
}
