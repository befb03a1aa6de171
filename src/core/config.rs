//! Logger configuration
//!
//! Every section derives serde with `#[serde(default)]`, so a JSON document
//! only needs the keys it changes. Durations are written in milliseconds
//! (`flush_interval_ms`, `tick_ms`); negative counts or durations are rejected
//! while parsing. Worker count and buffer size are corrected rather than
//! rejected when they are zero or negative.
//!
//! ```
//! use rust_logger_core::{LogLevel, LoggerConfig};
//!
//! let config = LoggerConfig::from_json(r#"{
//!     "level": "debug",
//!     "async": { "enabled": true, "buffer_size": -1, "workers": 0 },
//!     "sampling": { "enabled": true, "initial": 10, "thereafter": 5, "levels": ["debug"] }
//! }"#).unwrap();
//!
//! assert_eq!(config.level, LogLevel::Debug);
//! assert_eq!(config.async_config.effective_buffer_size(), 100);
//! assert_eq!(config.async_config.effective_workers(), 1);
//! ```

use super::error::{LoggerError, Result};
use super::field::Field;
use super::log_level::LogLevel;
use super::provider::ProviderConfig;
use super::sampling::SamplingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Queue capacity used when the configured size is zero or negative
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Upper bound on queue capacity; the queue is allocated up front
pub const MAX_BUFFER_SIZE: usize = 1 << 20;

/// Upper bound on worker threads
pub const MAX_WORKERS: usize = 256;

/// Serde adapter storing a `Duration` as whole milliseconds
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Async processing section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncConfig {
    pub enabled: bool,

    /// Queue capacity; `<= 0` means [`DEFAULT_BUFFER_SIZE`]
    pub buffer_size: i64,

    /// Periodic flush period; zero disables the flusher
    #[serde(rename = "flush_interval_ms", with = "duration_ms")]
    pub flush_interval: Duration,

    /// Worker threads; `<= 0` means one
    pub workers: i64,

    /// Discard entries when the queue is full instead of writing them inline
    pub drop_on_full: bool,
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: DEFAULT_BUFFER_SIZE as i64,
            flush_interval: Duration::from_secs(1),
            workers: 1,
            drop_on_full: false,
        }
    }
}

impl AsyncConfig {
    /// Enabled config with the given queue size and worker count
    pub fn new(buffer_size: i64, workers: i64) -> Self {
        Self {
            enabled: true,
            buffer_size,
            workers,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    #[must_use]
    pub fn with_drop_on_full(mut self, drop_on_full: bool) -> Self {
        self.drop_on_full = drop_on_full;
        self
    }

    pub fn effective_buffer_size(&self) -> usize {
        if self.buffer_size <= 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            usize::try_from(self.buffer_size)
                .unwrap_or(MAX_BUFFER_SIZE)
                .min(MAX_BUFFER_SIZE)
        }
    }

    pub fn effective_workers(&self) -> usize {
        if self.workers <= 0 {
            1
        } else {
            usize::try_from(self.workers)
                .unwrap_or(MAX_WORKERS)
                .min(MAX_WORKERS)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.buffer_size > MAX_BUFFER_SIZE as i64 {
            return Err(LoggerError::config(
                "AsyncConfig",
                format!("buffer_size {} exceeds {}", self.buffer_size, MAX_BUFFER_SIZE),
            ));
        }
        if self.workers > MAX_WORKERS as i64 {
            return Err(LoggerError::config(
                "AsyncConfig",
                format!("workers {} exceeds {}", self.workers, MAX_WORKERS),
            ));
        }
        Ok(())
    }
}

/// Complete configuration consumed by [`CoreLogger`](super::logger::CoreLogger)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub add_caller: bool,
    pub add_stacktrace: bool,

    /// Fields appended to every entry, ahead of call-site fields
    pub global_fields: Vec<Field>,

    #[serde(rename = "async")]
    pub async_config: AsyncConfig,

    pub sampling: SamplingConfig,

    pub provider: ProviderConfig,
}

impl LoggerConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LoggerConfig = serde_json::from_str(json)
            .map_err(|e| LoggerError::config("LoggerConfig", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the pipeline cannot start with
    pub fn validate(&self) -> Result<()> {
        self.validate_pipeline()?;
        self.provider.validate()
    }

    /// Everything except the provider section, which an explicitly supplied
    /// provider makes irrelevant
    pub(crate) fn validate_pipeline(&self) -> Result<()> {
        if let Some(field) = self.global_fields.iter().find(|f| f.key.is_empty()) {
            return Err(LoggerError::config(
                "LoggerConfig",
                format!("global field with value '{}' has an empty key", field.value),
            ));
        }
        if self.async_config.enabled {
            self.async_config.validate()?;
        }
        Ok(())
    }
}
