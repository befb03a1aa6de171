//! # Rust Logger Core
//!
//! Asynchronous log-processing core that sits between application call sites
//! and a pluggable output provider.
//!
//! ## Features
//!
//! - **Cheap filtering**: disabled levels return before any allocation
//! - **Sampling**: per-level warm-up window then one-in-N, with periodic reset
//! - **Async dispatch**: bounded queue, fixed worker pool, drop or sync fallback when full
//! - **Pooling**: entries and render buffers are reused across calls
//! - **Extensible**: middleware, hooks and providers behind small traits
//!
//! ## Example
//!
//! ```
//! use rust_logger_core::prelude::*;
//! use rust_logger_core::{fields, info};
//!
//! let logger = CoreLogger::builder()
//!     .level(LogLevel::Info)
//!     .async_mode(AsyncConfig::new(1024, 2))
//!     .provider(ConsoleProvider::new().with_output_format(OutputFormat::Json))
//!     .build()
//!     .unwrap();
//!
//! info!(logger, "listening on port {}", 8080);
//! logger.warn("slow request", &fields!["path" => "/search", "ms" => 812]);
//!
//! logger.close().unwrap();
//! ```

pub mod core;
pub mod macros;
pub mod providers;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::providers::ConsoleProvider;
    #[cfg(feature = "file")]
    pub use crate::providers::FileProvider;
    pub use crate::core::{
        AsyncConfig, Context, CoreLogger, Field, FieldValue, FnHook, Hook, LogEntry, LogLevel,
        LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, Middleware, OutputFormat,
        Provider, ProviderConfig, ProviderRegistry, Result, SamplingConfig, TimestampFormat,
    };
}

pub use core::{
    AsyncConfig, AsyncProcessor, Caller, Context, CoreLogger, EntryHandler, Field, FieldType,
    FieldValue, FnHook, Hook, LogEntry, LogLevel, LoggerBuilder, LoggerConfig, LoggerError,
    LoggerMetrics, Middleware, ObjectPools, OutputFormat, ProcessOutcome, ProcessorState,
    Provider, ProviderConfig, ProviderRegistry, Result, Sampler, SamplerMetrics, SamplingConfig,
    TimestampFormat,
};
#[cfg(feature = "console")]
pub use providers::ConsoleProvider;
#[cfg(feature = "file")]
pub use providers::FileProvider;
