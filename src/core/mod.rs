//! Core logger types and traits

pub mod config;
pub mod context;
pub mod error;
pub mod extension;
pub mod field;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod pool;
pub mod processor;
pub mod provider;
pub mod sampling;
pub mod timestamp;

pub use config::{AsyncConfig, LoggerConfig};
pub use context::Context;
pub use error::{LoggerError, Result};
pub use extension::{FnHook, Hook, Middleware};
pub use field::{Field, FieldType, FieldValue};
pub use log_entry::{Caller, LogEntry};
pub use log_level::LogLevel;
pub use logger::{CoreLogger, LoggerBuilder, TERMINAL_FLUSH_TIMEOUT};
pub use metrics::LoggerMetrics;
pub use output_format::OutputFormat;
pub use pool::{BufferPool, EntryPool, ObjectPools, PooledEntry};
pub use processor::{AsyncProcessor, EntryHandler, ProcessOutcome, ProcessorState};
pub use provider::{Provider, ProviderConfig, ProviderFactory, ProviderRegistry};
pub use sampling::{Sampler, SamplerMetrics, SamplingConfig};
pub use timestamp::TimestampFormat;
