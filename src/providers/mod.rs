//! Bundled providers

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "console")]
pub use console::ConsoleProvider;
#[cfg(feature = "file")]
pub use file::FileProvider;
