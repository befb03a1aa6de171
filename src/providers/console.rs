//! Console provider

use crate::core::output_format::render_text_with_label;
use crate::core::pool::BufferPool;
use crate::core::{
    LogEntry, LoggerError, OutputFormat, Provider, ProviderConfig, Result, TimestampFormat,
};
use colored::Colorize;
use parking_lot::RwLock;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct ConsoleSettings {
    use_colors: bool,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

/// Writes Error and above to stderr, everything else to stdout
///
/// Each entry is rendered into a pooled buffer and written with a single
/// locked `write_all`, so lines from concurrent workers never interleave.
#[derive(Debug)]
pub struct ConsoleProvider {
    settings: RwLock<ConsoleSettings>,
    buffers: Arc<BufferPool>,
    closed: AtomicBool,
}

impl ConsoleProvider {
    pub fn new() -> Self {
        Self::from_config(&ProviderConfig::console(), Arc::new(BufferPool::default()))
    }

    pub fn from_config(config: &ProviderConfig, buffers: Arc<BufferPool>) -> Self {
        Self {
            settings: RwLock::new(ConsoleSettings {
                use_colors: config.use_colors,
                timestamp_format: config.timestamp_format.clone(),
                output_format: config.format,
            }),
            buffers,
            closed: AtomicBool::new(false),
        }
    }

    /// # Example
    ///
    /// ```
    /// use rust_logger_core::providers::ConsoleProvider;
    /// use rust_logger_core::OutputFormat;
    ///
    /// let provider = ConsoleProvider::new().with_output_format(OutputFormat::Json);
    /// ```
    #[must_use]
    pub fn with_output_format(self, format: OutputFormat) -> Self {
        self.settings.write().output_format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(self, format: TimestampFormat) -> Self {
        self.settings.write().timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_colors(self, use_colors: bool) -> Self {
        self.settings.write().use_colors = use_colors;
        self
    }

    /// Render `entry` plus a trailing newline into `out`
    fn render(&self, entry: &LogEntry, out: &mut Vec<u8>) -> Result<()> {
        let settings = self.settings.read();
        match settings.output_format {
            OutputFormat::Text if settings.use_colors => {
                let label = format!("{:5}", entry.level.to_str()).color(entry.level.color_code());
                render_text_with_label(entry, &settings.timestamp_format, label, out)?;
            }
            format => format.render(entry, &settings.timestamp_format, out)?,
        }
        out.push(b'\n');
        Ok(())
    }
}

impl Default for ConsoleProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for ConsoleProvider {
    fn name(&self) -> &str {
        "console"
    }

    fn configure(&self, config: &ProviderConfig) -> Result<()> {
        let mut settings = self.settings.write();
        settings.use_colors = config.use_colors;
        settings.timestamp_format = config.timestamp_format.clone();
        settings.output_format = config.format;
        Ok(())
    }

    fn health_check(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::ProviderClosed(self.name().to_string()));
        }
        Ok(())
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::ProviderClosed(self.name().to_string()));
        }

        let mut buffer = self.buffers.acquire();
        self.render(entry, &mut buffer)?;

        if entry.level.is_error_or_above() {
            std::io::stderr().lock().write_all(&buffer)?;
        } else {
            std::io::stdout().lock().write_all(&buffer)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Field, LogLevel};

    #[test]
    fn test_render_plain_text() {
        let provider = ConsoleProvider::new().with_colors(false);
        let entry = LogEntry::new(LogLevel::Warn, "disk at 91%").with_field(Field::new("mount", "/"));
        let mut out = Vec::new();
        provider.render(&entry, &mut out).unwrap();

        let line = String::from_utf8(out).unwrap();
        assert!(line.contains("[WARN ] disk at 91% mount=/"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_render_colored_text_keeps_message() {
        let provider = ConsoleProvider::new().with_colors(true);
        let mut out = Vec::new();
        provider
            .render(&LogEntry::new(LogLevel::Error, "boom"), &mut out)
            .unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.contains("ERROR"));
        assert!(line.contains("boom"));
    }

    #[test]
    fn test_render_json() {
        let provider = ConsoleProvider::new().with_output_format(OutputFormat::Json);
        let mut out = Vec::new();
        provider
            .render(&LogEntry::new(LogLevel::Info, "hi"), &mut out)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["message"], "hi");
    }

    #[test]
    fn test_configure_switches_format() {
        let provider = ConsoleProvider::new();
        provider
            .configure(&ProviderConfig::console().with_format(OutputFormat::Logfmt))
            .unwrap();
        let mut out = Vec::new();
        provider
            .render(&LogEntry::new(LogLevel::Info, "hi"), &mut out)
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("message=\"hi\""));
    }

    #[test]
    fn test_write_uses_pool_and_close_rejects() {
        let buffers = Arc::new(BufferPool::new(4, 64));
        let provider = ConsoleProvider::from_config(&ProviderConfig::console(), Arc::clone(&buffers));

        provider.write(&LogEntry::new(LogLevel::Debug, "to stdout")).unwrap();
        provider.write(&LogEntry::new(LogLevel::Debug, "again")).unwrap();
        assert_eq!(buffers.acquired_count(), 2);
        assert_eq!(buffers.allocated_count(), 1);

        provider.close().unwrap();
        provider.close().unwrap();
        assert!(matches!(
            provider.write(&LogEntry::new(LogLevel::Info, "late")),
            Err(LoggerError::ProviderClosed(_))
        ));
        assert!(provider.health_check().is_err());
    }
}
