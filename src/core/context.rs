//! Ambient request-scoped context and correlation id extraction
//!
//! A [`Context`] is a plain key-value map carried alongside a logger. The
//! extraction functions never fail: an absent key, a `Null` value or a value
//! of the wrong type all read as an empty string.

use super::field::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TRACE_ID_KEY: &str = "trace_id";
pub const TRACE_ID_KEY_CAMEL: &str = "traceId";
pub const SPAN_ID_KEY: &str = "span_id";
pub const SPAN_ID_KEY_CAMEL: &str = "spanId";
pub const USER_ID_KEY: &str = "user_id";
pub const REQUEST_ID_KEY: &str = "request_id";

/// Key-value context attached to a logger
///
/// # Example
///
/// ```
/// use rust_logger_core::core::context::{self, Context};
///
/// let ctx = Context::new()
///     .with_value("trace_id", "4bf92f35")
///     .with_value("user_id", 42);
///
/// assert_eq!(context::trace_id(&ctx), "4bf92f35");
/// // Non-string values degrade to "absent"
/// assert_eq!(context::user_id(&ctx), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    values: HashMap<String, FieldValue>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_value<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Copy every entry of `other` into this context, overwriting equal keys
    pub fn merge(&mut self, other: &Context) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn string_value<'a>(ctx: &'a Context, key: &str) -> Option<&'a str> {
    ctx.get(key).and_then(FieldValue::as_str)
}

/// Trace id under `trace_id`, falling back to `traceId`
pub fn trace_id(ctx: &Context) -> &str {
    string_value(ctx, TRACE_ID_KEY)
        .or_else(|| string_value(ctx, TRACE_ID_KEY_CAMEL))
        .unwrap_or("")
}

/// Span id under `span_id`, falling back to `spanId`
pub fn span_id(ctx: &Context) -> &str {
    string_value(ctx, SPAN_ID_KEY)
        .or_else(|| string_value(ctx, SPAN_ID_KEY_CAMEL))
        .unwrap_or("")
}

pub fn user_id(ctx: &Context) -> &str {
    string_value(ctx, USER_ID_KEY).unwrap_or("")
}

pub fn request_id(ctx: &Context) -> &str {
    string_value(ctx, REQUEST_ID_KEY).unwrap_or("")
}
