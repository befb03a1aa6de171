//! File provider

use crate::core::pool::BufferPool;
use crate::core::{
    LogEntry, LoggerError, OutputFormat, Provider, ProviderConfig, Result, TimestampFormat,
};
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct FileSettings {
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

#[derive(Debug)]
struct FileState {
    path: PathBuf,
    /// `None` once closed
    writer: Option<BufWriter<File>>,
}

fn open(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::io_operation("opening log file", path.display().to_string(), e)
        })?;
    Ok(BufWriter::new(file))
}

/// Appends one rendered entry per line to a file
///
/// Rendering happens outside the file lock; only the final `write_all` is
/// serialized.
#[derive(Debug)]
pub struct FileProvider {
    settings: RwLock<FileSettings>,
    state: Mutex<FileState>,
    buffers: Arc<BufferPool>,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::from_config(&ProviderConfig::file(path), Arc::new(BufferPool::default()))
    }

    pub fn from_config(config: &ProviderConfig, buffers: Arc<BufferPool>) -> Result<Self> {
        let path = config
            .path
            .clone()
            .ok_or_else(|| LoggerError::config("FileProvider", "a path is required"))?;
        let writer = open(&path)?;

        Ok(Self {
            settings: RwLock::new(FileSettings {
                timestamp_format: config.timestamp_format.clone(),
                output_format: config.format,
            }),
            state: Mutex::new(FileState {
                path,
                writer: Some(writer),
            }),
            buffers,
        })
    }

    /// # Example
    ///
    /// ```no_run
    /// use rust_logger_core::providers::FileProvider;
    /// use rust_logger_core::OutputFormat;
    ///
    /// let provider = FileProvider::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_output_format(OutputFormat::Json);
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

    pub fn path(&self) -> PathBuf {
        self.state.lock().path.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().writer.is_none()
    }
}

impl Provider for FileProvider {
    fn name(&self) -> &str {
        "file"
    }

    /// Updates formats; a different path switches to the new file
    fn configure(&self, config: &ProviderConfig) -> Result<()> {
        {
            let mut settings = self.settings.write();
            settings.timestamp_format = config.timestamp_format.clone();
            settings.output_format = config.format;
        }

        let Some(path) = &config.path else {
            return Ok(());
        };
        let mut state = self.state.lock();
        if state.writer.is_none() {
            return Err(LoggerError::ProviderClosed(self.name().to_string()));
        }
        if state.path != *path {
            let writer = open(path)?;
            if let Some(mut old) = state.writer.replace(writer) {
                old.flush()?;
            }
            state.path = path.clone();
        }
        Ok(())
    }

    fn health_check(&self) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::ProviderClosed(self.name().to_string()));
        }
        Ok(())
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let mut buffer = self.buffers.acquire();
        {
            let settings = self.settings.read();
            settings
                .output_format
                .render(entry, &settings.timestamp_format, &mut buffer)?;
        }
        buffer.push(b'\n');

        let mut state = self.state.lock();
        let writer = state
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::ProviderClosed("file".to_string()))?;
        writer.write_all(&buffer)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.state.lock().writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let writer = self.state.lock().writer.take();
        if let Some(mut writer) = writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileProvider {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush log file on drop: {}", e);
        }
    }
}
