//! Logging macros for ergonomic log message formatting.
//!
//! The level macros take a logger and `format!` arguments; structured fields
//! go through [`fields!`](crate::fields) and the logger methods directly.
//!
//! # Examples
//!
//! ```
//! use rust_logger_core::prelude::*;
//! use rust_logger_core::{fields, info};
//!
//! let logger = CoreLogger::builder()
//!     .provider(ConsoleProvider::new().with_colors(false))
//!     .build()
//!     .unwrap();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! logger.info("user login", &fields!["user" => 42, "method" => "sso"]);
//! ```

/// Build a `Vec<Field>` from `key => value` pairs.
///
/// ```
/// use rust_logger_core::{fields, FieldValue};
///
/// let fields = fields!["user" => "alice", "attempt" => 3];
/// assert_eq!(fields[1].value, FieldValue::Int(3));
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<$crate::Field>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Field::new($key, $value)),+]
    };
}

/// Log a message at the given level.
///
/// ```
/// # use rust_logger_core::prelude::*;
/// # let logger = CoreLogger::builder().provider(ConsoleProvider::new()).build().unwrap();
/// use rust_logger_core::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), &[])
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message, then terminate through the provider.
///
/// ```no_run
/// # use rust_logger_core::prelude::*;
/// # let logger = CoreLogger::builder().provider(ConsoleProvider::new()).build().unwrap();
/// use rust_logger_core::fatal;
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
