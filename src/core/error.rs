//! Error types for the logging core

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Unknown level name
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// No factory registered under the requested provider name
    #[error("Provider '{0}' is not registered")]
    ProviderNotFound(String),

    /// Provider failed to write, flush or close
    #[error("Provider '{provider}' failed: {message}")]
    ProviderError { provider: String, message: String },

    /// Provider used after close
    #[error("Provider '{0}' is closed")]
    ProviderClosed(String),

    /// Hook returned an error or panicked
    #[error("Hook '{hook}' failed: {message}")]
    HookFailed { hook: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a provider failure
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::ProviderError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a hook failure
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::HookFailed {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error came from configuration or construction
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. }
                | LoggerError::InvalidLevel(_)
                | LoggerError::ProviderNotFound(_)
        )
    }
}

/// Readable message from a `catch_unwind` payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("AsyncConfig", "flush interval overflow");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.is_configuration());

        let err = LoggerError::provider("console", "stdout closed");
        assert!(matches!(err, LoggerError::ProviderError { .. }));
        assert!(!err.is_configuration());

        let err = LoggerError::hook("audit", "sink unavailable");
        assert!(matches!(err, LoggerError::HookFailed { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::config("SamplingConfig", "levels must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for SamplingConfig: levels must not be empty"
        );

        let err = LoggerError::InvalidLevel("verbose".to_string());
        assert_eq!(err.to_string(), "Invalid log level: 'verbose'");

        let err = LoggerError::ProviderNotFound("syslog".to_string());
        assert_eq!(err.to_string(), "Provider 'syslog' is not registered");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("opening log file", "cannot open file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("opening log file"));
        assert!(err.to_string().contains("cannot open file"));
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("worker {} down", 3)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "worker 3 down");

        let payload = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
    }
}
