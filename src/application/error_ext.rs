//! Error conversion helpers for common I/O operations
//!
//! Provides extension traits for cleaner error handling with context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add option-name context to a store error.
    ///
    /// # Example
    /// ```ignore
    /// store.get(name).with_option_context("read option", name)?;
    /// ```
    fn with_option_context(self, action: &str, name: &str) -> ApplicationResult<T>;

    /// Add path context to an I/O error, reported as a config error.
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_option_context(self, action: &str, name: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Store {
            context: format!("{action}: {name}"),
            source: e,
        })
    }

    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Config {
            message: format!("{} {}: {}", action, path.display(), e),
        })
    }
}
