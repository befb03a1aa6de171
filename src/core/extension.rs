//! Middleware and hooks
//!
//! Middleware runs first, in registration order, and may rewrite an entry or
//! cancel it by returning `false`. Hooks run afterwards as side effects for
//! the levels they subscribe to; their failures never reach the caller.

use super::error::Result;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;

/// Entry rewriter or filter
///
/// Plain closures work as middleware:
///
/// ```
/// use rust_logger_core::{LogEntry, LogLevel, Middleware};
///
/// let redact = |entry: &mut LogEntry| {
///     entry.message = entry.message.replace("hunter2", "***");
///     true
/// };
///
/// let mut entry = LogEntry::new(LogLevel::Info, "password is hunter2");
/// assert!(redact.process(&mut entry));
/// assert_eq!(entry.message, "password is ***");
/// ```
pub trait Middleware: Send + Sync {
    /// Return `false` to cancel the entry
    fn process(&self, entry: &mut LogEntry) -> bool;
}

impl<F> Middleware for F
where
    F: Fn(&mut LogEntry) -> bool + Send + Sync,
{
    fn process(&self, entry: &mut LogEntry) -> bool {
        self(entry)
    }
}

/// Side effect fired for entries at selected levels
pub trait Hook: Send + Sync {
    fn name(&self) -> &str;

    /// Levels this hook fires for
    fn levels(&self) -> &[LogLevel];

    fn fire(&self, entry: &LogEntry) -> Result<()>;
}

type HookFn = Box<dyn Fn(&LogEntry) -> Result<()> + Send + Sync>;

/// Hook built from a closure
pub struct FnHook {
    name: String,
    levels: Vec<LogLevel>,
    callback: HookFn,
}

impl FnHook {
    pub fn new<F>(name: impl Into<String>, levels: Vec<LogLevel>, callback: F) -> Self
    where
        F: Fn(&LogEntry) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            levels,
            callback: Box::new(callback),
        }
    }

    /// Hook firing for Error and above
    pub fn on_errors<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&LogEntry) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(
            name,
            vec![LogLevel::Error, LogLevel::Fatal, LogLevel::Panic],
            callback,
        )
    }
}

impl Hook for FnHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn levels(&self) -> &[LogLevel] {
        &self.levels
    }

    fn fire(&self, entry: &LogEntry) -> Result<()> {
        (self.callback)(entry)
    }
}

impl std::fmt::Debug for FnHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHook")
            .field("name", &self.name)
            .field("levels", &self.levels)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use crate::core::field::Field;

    #[test]
    fn test_closure_middleware_can_cancel() {
        let drop_debug = |entry: &mut LogEntry| entry.level != LogLevel::Debug;
        assert!(!drop_debug.process(&mut LogEntry::new(LogLevel::Debug, "noise")));
        assert!(drop_debug.process(&mut LogEntry::new(LogLevel::Info, "signal")));
    }

    #[test]
    fn test_middleware_rewrites_fields() {
        let tag = |entry: &mut LogEntry| {
            entry.fields.push(Field::new("region", "eu-west-1"));
            true
        };
        let mut entry = LogEntry::new(LogLevel::Info, "m");
        tag.process(&mut entry);
        assert_eq!(entry.field("region").map(|f| f.value.to_string()), Some("eu-west-1".to_string()));
    }

    #[test]
    fn test_fn_hook() {
        let hook = FnHook::on_errors("alert", |entry| {
            if entry.message.is_empty() {
                Err(LoggerError::hook("alert", "empty message"))
            } else {
                Ok(())
            }
        });

        assert_eq!(hook.name(), "alert");
        assert!(hook.levels().contains(&LogLevel::Fatal));
        assert!(!hook.levels().contains(&LogLevel::Warn));
        assert!(hook.fire(&LogEntry::new(LogLevel::Error, "disk full")).is_ok());
        assert!(hook.fire(&LogEntry::new(LogLevel::Error, "")).is_err());
    }
}
