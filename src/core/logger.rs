//! Core logger
//!
//! [`CoreLogger`] is the entry point applications hold. Each call runs the
//! same pipeline: level threshold, sampling, entry construction from the
//! pool, context extraction, middleware, hooks, then dispatch to the async
//! processor or straight to the provider.
//!
//! Loggers derived with [`CoreLogger::with_fields`], [`CoreLogger::with_context`]
//! or `clone()` share one pipeline but own their fields, context and level.

use super::config::{AsyncConfig, LoggerConfig};
use super::context::{self, Context, REQUEST_ID_KEY, USER_ID_KEY};
use super::error::{panic_message, LoggerError, Result};
use super::extension::{Hook, Middleware};
use super::field::{Field, FieldValue};
use super::log_entry::{Caller, LogEntry};
use super::log_level::LogLevel;
use super::metrics::LoggerMetrics;
use super::pool::{ObjectPools, PooledEntry};
use super::processor::{AsyncProcessor, EntryHandler, ProcessorState};
use super::provider::{Provider, ProviderConfig, ProviderRegistry};
use super::sampling::{SamplerMetrics, Sampler, SamplingConfig};
use chrono::Utc;
use parking_lot::RwLock;
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Longest a Fatal or Panic call waits for queued entries before terminating
pub const TERMINAL_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands dequeued entries to the provider
struct Dispatcher {
    provider: Arc<dyn Provider>,
    metrics: Arc<LoggerMetrics>,
}

impl EntryHandler for Dispatcher {
    fn handle(&self, entry: &LogEntry) {
        match self.provider.write(entry) {
            Ok(()) => {
                self.metrics.record_logged();
            }
            Err(e) => {
                self.metrics.record_provider_error();
                eprintln!(
                    "[LOGGER ERROR] Provider '{}' failed to write: {}",
                    self.provider.name(),
                    e
                );
            }
        }
    }

    fn flush(&self) {
        if let Err(e) = self.provider.flush() {
            eprintln!(
                "[LOGGER ERROR] Provider '{}' flush failed: {}",
                self.provider.name(),
                e
            );
        }
    }
}

/// State shared by a logger and everything derived from it
struct Pipeline {
    provider: Arc<dyn Provider>,
    dispatcher: Arc<Dispatcher>,
    processor: Option<AsyncProcessor>,
    sampler: Option<Sampler>,
    middleware: Vec<Arc<dyn Middleware>>,
    hooks: Vec<Arc<dyn Hook>>,
    pools: Arc<ObjectPools>,
    metrics: Arc<LoggerMetrics>,
    add_caller: bool,
    add_stacktrace: bool,
    closed: AtomicBool,
}

impl Pipeline {
    /// Run middleware in order; `false` if one cancelled the entry
    fn run_middleware(&self, entry: &mut LogEntry) -> bool {
        for middleware in &self.middleware {
            match catch_unwind(AssertUnwindSafe(|| middleware.process(entry))) {
                Ok(true) => {}
                Ok(false) => {
                    self.metrics.record_cancelled();
                    return false;
                }
                Err(payload) => {
                    self.metrics.record_cancelled();
                    eprintln!(
                        "[LOGGER CRITICAL] Middleware panicked: {}. Entry discarded.",
                        panic_message(payload.as_ref())
                    );
                    return false;
                }
            }
        }
        true
    }

    fn fire_hooks(&self, entry: &LogEntry) {
        for hook in &self.hooks {
            if !hook.levels().contains(&entry.level) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| hook.fire(entry))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.metrics.record_hook_error();
                    eprintln!("[LOGGER ERROR] Hook '{}' failed: {}", hook.name(), e);
                }
                Err(payload) => {
                    self.metrics.record_hook_error();
                    eprintln!(
                        "[LOGGER CRITICAL] Hook '{}' panicked: {}",
                        hook.name(),
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }

    fn dispatch(&self, entry: &PooledEntry<'_>) {
        if let Some(processor) = &self.processor {
            if !entry.level.is_terminal() {
                processor.enqueue(entry.to_owned_entry());
                return;
            }
            // Earlier entries first; the terminal one bypasses the queue
            self.drain_before_exit(processor);
        }
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.dispatcher.handle(entry))) {
            self.metrics.record_handler_panic();
            eprintln!(
                "[LOGGER CRITICAL] Provider '{}' panicked: {}",
                self.provider.name(),
                panic_message(payload.as_ref())
            );
        }
    }

    fn drain_before_exit(&self, processor: &AsyncProcessor) {
        if !processor.flush_timeout(TERMINAL_FLUSH_TIMEOUT) {
            eprintln!(
                "[LOGGER WARNING] Queue not drained within {:?} before termination",
                TERMINAL_FLUSH_TIMEOUT
            );
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(processor) = &self.processor {
            processor.flush();
        }
        self.provider.flush()
    }

    /// Flush bounded by [`TERMINAL_FLUSH_TIMEOUT`], reporting instead of failing
    fn flush_before_exit(&self) {
        if let Some(processor) = &self.processor {
            self.drain_before_exit(processor);
        }
        if let Err(e) = self.provider.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush before termination: {}", e);
        }
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(sampler) = &self.sampler {
            sampler.close();
        }
        if let Some(processor) = &self.processor {
            processor.close();
        }
        let flushed = self.provider.flush();
        let closed = self.provider.close();
        flushed.and(closed)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close provider during shutdown: {}", e);
        }

        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} dropped logs (drop rate: {:.2}%)",
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

/// Structured logger
///
/// # Example
///
/// ```
/// use rust_logger_core::prelude::*;
///
/// let logger = CoreLogger::builder()
///     .level(LogLevel::Debug)
///     .global_field("service", "billing")
///     .provider(ConsoleProvider::new().with_colors(false))
///     .build()
///     .unwrap();
///
/// logger.info("invoice sent", &[Field::new("invoice", 1042)]);
///
/// let request = logger.with_context(&Context::new().with_value("trace_id", "4bf92f35"));
/// request.debug("charging card", &[]);
///
/// logger.close().unwrap();
/// ```
pub struct CoreLogger {
    level: RwLock<LogLevel>,
    global_fields: Vec<Field>,
    context: Context,
    pipeline: Arc<Pipeline>,
}

impl CoreLogger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Logger over an existing provider
    pub fn new(config: LoggerConfig, provider: Arc<dyn Provider>) -> Result<Self> {
        Self::builder()
            .config(config)
            .shared_provider(provider)
            .build()
    }

    /// Logger whose provider is created from `config.provider` via `registry`
    pub fn from_config(config: LoggerConfig, registry: &ProviderRegistry) -> Result<Self> {
        Self::builder()
            .config(config)
            .registry(registry.clone())
            .build()
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, fields: &[Field]) {
        self.log_at(level, message.as_ref(), fields, Location::caller());
    }

    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log_at(LogLevel::Trace, message.as_ref(), fields, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log_at(LogLevel::Debug, message.as_ref(), fields, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log_at(LogLevel::Info, message.as_ref(), fields, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log_at(LogLevel::Warn, message.as_ref(), fields, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log_at(LogLevel::Error, message.as_ref(), fields, Location::caller());
    }

    /// Log, flush, then let the provider end the process
    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log_at(LogLevel::Fatal, message.as_ref(), fields, Location::caller());
    }

    /// Log, flush, then let the provider panic
    #[track_caller]
    pub fn panic(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log_at(LogLevel::Panic, message.as_ref(), fields, Location::caller());
    }

    fn log_at(
        &self,
        level: LogLevel,
        message: &str,
        fields: &[Field],
        location: &'static Location<'static>,
    ) {
        if level.is_terminal() {
            self.emit(level, message, fields, location);
            self.pipeline.flush_before_exit();
            self.pipeline.provider.terminate(level, message);
            return;
        }

        if level < *self.level.read() {
            return;
        }
        if let Some(sampler) = &self.pipeline.sampler {
            if sampler.should_drop(level) {
                return;
            }
        }
        self.emit(level, message, fields, location);
    }

    /// Build, filter and dispatch one entry
    fn emit(
        &self,
        level: LogLevel,
        message: &str,
        fields: &[Field],
        location: &'static Location<'static>,
    ) {
        let pipeline = &*self.pipeline;
        if pipeline.closed.load(Ordering::Acquire) {
            pipeline.metrics.record_rejected_after_close();
            return;
        }

        // Returned to the pool when this function exits, on every path
        let mut entry = pipeline.pools.entries.acquire();
        entry.level = level;
        entry.message.push_str(message);
        entry.time = Utc::now();
        entry.fields.extend_from_slice(&self.global_fields);
        entry.fields.extend_from_slice(fields);

        entry.trace_id.push_str(context::trace_id(&self.context));
        entry.span_id.push_str(context::span_id(&self.context));
        let user_id = context::user_id(&self.context);
        if !user_id.is_empty() {
            entry.fields.push(Field::new(USER_ID_KEY, user_id));
        }
        let request_id = context::request_id(&self.context);
        if !request_id.is_empty() {
            entry.fields.push(Field::new(REQUEST_ID_KEY, request_id));
        }

        if pipeline.add_caller {
            entry.caller = Some(Caller::from_location(location));
        }
        if pipeline.add_stacktrace && level.is_error_or_above() {
            entry.stack_trace = Some(Backtrace::force_capture().to_string());
        }

        if !pipeline.run_middleware(&mut entry) {
            return;
        }
        pipeline.fire_hooks(&entry);
        pipeline.dispatch(&entry);
    }

    /// Child logger with extra fields appended after the current ones
    #[must_use]
    pub fn with_fields(&self, fields: &[Field]) -> Self {
        let mut child = self.clone();
        child.global_fields.extend_from_slice(fields);
        child
    }

    /// Child logger bound to `ctx` in place of the current context
    #[must_use]
    pub fn with_context(&self, ctx: &Context) -> Self {
        let mut child = self.clone();
        child.context = ctx.clone();
        child
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        level >= *self.level.read()
    }

    pub fn fields(&self) -> &[Field] {
        &self.global_fields
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Drain the queue, then flush the provider
    pub fn flush(&self) -> Result<()> {
        self.pipeline.flush()
    }

    /// Stop the sampler, drain and stop the processor, close the provider
    ///
    /// Shared by every logger derived from this one; only the first call does
    /// any work.
    pub fn close(&self) -> Result<()> {
        self.pipeline.close()
    }

    pub fn is_closed(&self) -> bool {
        self.pipeline.closed.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.pipeline.metrics
    }

    pub fn sampler_metrics(&self) -> Option<&SamplerMetrics> {
        self.pipeline.sampler.as_ref().map(Sampler::metrics)
    }

    pub fn pools(&self) -> &ObjectPools {
        &self.pipeline.pools
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.pipeline.provider
    }

    /// `None` in synchronous mode
    pub fn processor_state(&self) -> Option<ProcessorState> {
        self.pipeline.processor.as_ref().map(AsyncProcessor::state)
    }
}

impl Clone for CoreLogger {
    fn clone(&self) -> Self {
        Self {
            level: RwLock::new(self.level()),
            global_fields: self.global_fields.clone(),
            context: self.context.clone(),
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl std::fmt::Debug for CoreLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreLogger")
            .field("level", &self.level())
            .field("fields", &self.global_fields)
            .field("provider", &self.pipeline.provider.name())
            .field("processor", &self.pipeline.processor)
            .field("sampler", &self.pipeline.sampler)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Builder for [`CoreLogger`]
///
/// Without an explicit provider, one is created from the provider section of
/// the configuration through the registry (the bundled defaults unless
/// [`registry`](LoggerBuilder::registry) is given).
#[derive(Default)]
pub struct LoggerBuilder {
    config: LoggerConfig,
    provider: Option<Arc<dyn Provider>>,
    registry: Option<ProviderRegistry>,
    middleware: Vec<Arc<dyn Middleware>>,
    hooks: Vec<Arc<dyn Hook>>,
    pools: Option<Arc<ObjectPools>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn add_caller(mut self, enabled: bool) -> Self {
        self.config.add_caller = enabled;
        self
    }

    /// Capture a stack trace for Error and above
    #[must_use = "builder methods return a new value"]
    pub fn add_stacktrace(mut self, enabled: bool) -> Self {
        self.config.add_stacktrace = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn global_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.config.global_fields.push(Field::new(key, value));
        self
    }

    /// Enable async mode with the given settings
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, config: AsyncConfig) -> Self {
        self.config.async_config = AsyncConfig {
            enabled: true,
            ..config
        };
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sampling(mut self, config: SamplingConfig) -> Self {
        self.config.sampling = SamplingConfig {
            enabled: true,
            ..config
        };
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn provider<P: Provider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shared_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Provider settings used when no provider is supplied directly
    #[must_use = "builder methods return a new value"]
    pub fn provider_config(mut self, config: ProviderConfig) -> Self {
        self.config.provider = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Append to the middleware chain
    #[must_use = "builder methods return a new value"]
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn hook<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Share pools with other loggers
    #[must_use = "builder methods return a new value"]
    pub fn pools(mut self, pools: Arc<ObjectPools>) -> Self {
        self.pools = Some(pools);
        self
    }

    /// Validate, create the provider, check its health and start threads
    pub fn build(self) -> Result<CoreLogger> {
        let config = self.config;
        config.validate_pipeline()?;

        let pools = self.pools.unwrap_or_default();
        let provider = match self.provider {
            Some(provider) => provider,
            None => self
                .registry
                .unwrap_or_else(ProviderRegistry::with_defaults)
                .create(&config.provider, Arc::clone(&pools.buffers))?,
        };
        provider.health_check().map_err(|e| {
            LoggerError::provider(
                provider.name(),
                format!("health check failed: {}", e),
            )
        })?;

        let metrics = Arc::new(LoggerMetrics::new());
        let dispatcher = Arc::new(Dispatcher {
            provider: Arc::clone(&provider),
            metrics: Arc::clone(&metrics),
        });

        let processor = if config.async_config.enabled {
            Some(AsyncProcessor::new(
                &config.async_config,
                Arc::clone(&dispatcher) as Arc<dyn EntryHandler>,
                Arc::clone(&metrics),
            )?)
        } else {
            None
        };

        let sampler = if config.sampling.enabled && !config.sampling.levels.is_empty() {
            Some(Sampler::new(config.sampling.clone()))
        } else {
            None
        };

        Ok(CoreLogger {
            level: RwLock::new(config.level),
            global_fields: config.global_fields,
            context: Context::new(),
            pipeline: Arc::new(Pipeline {
                provider,
                dispatcher,
                processor,
                sampler,
                middleware: self.middleware,
                hooks: self.hooks,
                pools,
                metrics,
                add_caller: config.add_caller,
                add_stacktrace: config.add_stacktrace,
                closed: AtomicBool::new(false),
            }),
        })
    }
}
