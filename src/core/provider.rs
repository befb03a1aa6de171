//! Provider boundary
//!
//! A [`Provider`] renders and writes entries. The logger hands it fully built
//! entries; providers can also be driven directly through the per-level
//! methods, which build the entry from a [`Context`] themselves.
//!
//! Providers are created by name through a [`ProviderRegistry`]. The registry
//! is an ordinary value passed to whoever builds loggers; there is no global
//! registration.

use super::context::Context;
use super::error::{LoggerError, Result};
use super::field::Field;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::output_format::OutputFormat;
use super::pool::BufferPool;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Settings shared by the bundled providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Registry name of the provider to create
    pub name: String,
    pub format: OutputFormat,
    pub timestamp_format: TimestampFormat,
    pub use_colors: bool,
    /// Output file for the file provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "console".to_string(),
            format: OutputFormat::default(),
            timestamp_format: TimestampFormat::default(),
            use_colors: true,
            path: None,
        }
    }
}

impl ProviderConfig {
    pub fn console() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "file".to_string(),
            use_colors: false,
            path: Some(path.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::config("ProviderConfig", "provider name is empty"));
        }
        if self.name == "file" && self.path.is_none() {
            return Err(LoggerError::config(
                "ProviderConfig",
                "file provider requires a path",
            ));
        }
        Ok(())
    }
}

/// Sink that renders and writes log entries
///
/// Implementations are shared across worker threads, so every method takes
/// `&self`; mutable state lives behind the provider's own locks.
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    /// Apply new settings to a live provider
    fn configure(&self, config: &ProviderConfig) -> Result<()>;

    /// Checked once when a logger is built; an error aborts the build
    fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn write(&self, entry: &LogEntry) -> Result<()>;

    fn flush(&self) -> Result<()>;

    fn close(&self) -> Result<()>;

    /// Process-ending action after a Fatal or Panic entry
    ///
    /// Panic unwinds the calling thread; anything else exits with status 1.
    fn terminate(&self, level: LogLevel, message: &str) {
        if level == LogLevel::Panic {
            panic!("{}", message);
        }
        std::process::exit(1);
    }

    fn trace(&self, ctx: &Context, message: &str, fields: &[Field]) -> Result<()> {
        self.write(&LogEntry::from_parts(LogLevel::Trace, ctx, message, fields))
    }

    fn debug(&self, ctx: &Context, message: &str, fields: &[Field]) -> Result<()> {
        self.write(&LogEntry::from_parts(LogLevel::Debug, ctx, message, fields))
    }

    fn info(&self, ctx: &Context, message: &str, fields: &[Field]) -> Result<()> {
        self.write(&LogEntry::from_parts(LogLevel::Info, ctx, message, fields))
    }

    fn warn(&self, ctx: &Context, message: &str, fields: &[Field]) -> Result<()> {
        self.write(&LogEntry::from_parts(LogLevel::Warn, ctx, message, fields))
    }

    fn error(&self, ctx: &Context, message: &str, fields: &[Field]) -> Result<()> {
        self.write(&LogEntry::from_parts(LogLevel::Error, ctx, message, fields))
    }

    /// Write, flush, then [`terminate`](Provider::terminate)
    fn fatal(&self, ctx: &Context, message: &str, fields: &[Field]) -> Result<()> {
        let written = self.write(&LogEntry::from_parts(LogLevel::Fatal, ctx, message, fields));
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Provider '{}' flush failed: {}", self.name(), e);
        }
        self.terminate(LogLevel::Fatal, message);
        written
    }

    fn panic(&self, ctx: &Context, message: &str, fields: &[Field]) -> Result<()> {
        let written = self.write(&LogEntry::from_parts(LogLevel::Panic, ctx, message, fields));
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Provider '{}' flush failed: {}", self.name(), e);
        }
        self.terminate(LogLevel::Panic, message);
        written
    }
}

impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn version(&self) -> &str {
        (**self).version()
    }

    fn configure(&self, config: &ProviderConfig) -> Result<()> {
        (**self).configure(config)
    }

    fn health_check(&self) -> Result<()> {
        (**self).health_check()
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        (**self).write(entry)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn terminate(&self, level: LogLevel, message: &str) {
        (**self).terminate(level, message)
    }
}

/// Builds a provider from its settings and the shared render buffers
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderConfig, Arc<BufferPool>) -> Result<Arc<dyn Provider>> + Send + Sync>;

/// Name to factory map
///
/// ```
/// use rust_logger_core::{ProviderConfig, ProviderRegistry};
/// use rust_logger_core::core::pool::BufferPool;
/// use std::sync::Arc;
///
/// let registry = ProviderRegistry::with_defaults();
/// let provider = registry
///     .create(&ProviderConfig::console(), Arc::new(BufferPool::default()))
///     .unwrap();
/// assert_eq!(provider.name(), "console");
/// ```
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the bundled providers enabled by crate features
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "console")]
        registry.register("console", |config, buffers| {
            let provider = crate::providers::ConsoleProvider::from_config(config, buffers);
            Ok(Arc::new(provider) as Arc<dyn Provider>)
        });

        #[cfg(feature = "file")]
        registry.register("file", |config, buffers| {
            let provider = crate::providers::FileProvider::from_config(config, buffers)?;
            Ok(Arc::new(provider) as Arc<dyn Provider>)
        });

        registry
    }

    /// Register a factory, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderConfig, Arc<BufferPool>) -> Result<Arc<dyn Provider>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create(
        &self,
        config: &ProviderConfig,
        buffers: Arc<BufferPool>,
    ) -> Result<Arc<dyn Provider>> {
        config.validate()?;
        let factory = self
            .factories
            .get(&config.name)
            .ok_or_else(|| LoggerError::ProviderNotFound(config.name.clone()))?;
        factory(config, buffers)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MemoryProvider {
        entries: Mutex<Vec<LogEntry>>,
        terminated: Mutex<Vec<LogLevel>>,
    }

    impl Provider for MemoryProvider {
        fn name(&self) -> &str {
            "memory"
        }

        fn configure(&self, _config: &ProviderConfig) -> Result<()> {
            Ok(())
        }

        fn write(&self, entry: &LogEntry) -> Result<()> {
            self.entries.lock().push(entry.clone());
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            Ok(())
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }

        fn terminate(&self, level: LogLevel, _message: &str) {
            self.terminated.lock().push(level);
        }
    }

    #[test]
    fn test_level_methods_use_context() {
        let provider = MemoryProvider::default();
        let ctx = Context::new().with_value("traceId", "abc");
        provider.warn(&ctx, "careful", &[Field::new("n", 1)]).unwrap();

        let entries = provider.entries.lock();
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].trace_id, "abc");
        assert_eq!(entries[0].fields.len(), 1);
    }

    #[test]
    fn test_fatal_writes_then_terminates() {
        let provider = MemoryProvider::default();
        provider.fatal(&Context::new(), "gone", &[]).unwrap();
        provider.panic(&Context::new(), "worse", &[]).unwrap();

        assert_eq!(provider.entries.lock().len(), 2);
        assert_eq!(*provider.terminated.lock(), vec![LogLevel::Fatal, LogLevel::Panic]);
    }

    #[test]
    fn test_default_version() {
        assert_eq!(MemoryProvider::default().version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ProviderRegistry::new();
        registry.register("memory", |_, _| Ok(Arc::new(MemoryProvider::default()) as Arc<dyn Provider>));

        let config = ProviderConfig {
            name: "memory".to_string(),
            ..Default::default()
        };
        let provider = registry.create(&config, Arc::new(BufferPool::default())).unwrap();
        assert_eq!(provider.name(), "memory");

        let missing = ProviderConfig {
            name: "syslog".to_string(),
            ..Default::default()
        };
        let err = registry
            .create(&missing, Arc::new(BufferPool::default()))
            .err()
            .unwrap();
        assert!(matches!(err, LoggerError::ProviderNotFound(name) if name == "syslog"));
    }

    #[test]
    fn test_defaults_registered() {
        let registry = ProviderRegistry::with_defaults();
        #[cfg(feature = "console")]
        assert!(registry.contains("console"));
        #[cfg(feature = "file")]
        assert!(registry.contains("file"));
        assert!(!registry.contains("network"));
    }

    #[test]
    fn test_config_validation() {
        assert!(ProviderConfig::console().validate().is_ok());
        assert!(ProviderConfig::file("/tmp/app.log").validate().is_ok());

        let no_path = ProviderConfig {
            name: "file".to_string(),
            ..Default::default()
        };
        assert!(no_path.validate().is_err());

        let no_name = ProviderConfig {
            name: " ".to_string(),
            ..Default::default()
        };
        assert!(no_name.validate().unwrap_err().is_configuration());
    }
}
