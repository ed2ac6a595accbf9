//! Discovery-specific error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or running the discovery pipeline.
///
/// Only configuration and watcher problems ever reach a caller. Per-module
/// failures are captured as [`DiscoveryError::ModuleUnreadable`] inside the
/// module's record and never abort a scan pass.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// An include or exclude rule is not a valid regular expression.
    #[error("Invalid match pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A module file could not be read.
    #[error("Module '{path}' could not be read: {source}")]
    ModuleUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file system watcher could not be created or attached.
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Watching needs a running tokio runtime.
    #[error("No tokio runtime available to drive the watcher")]
    NoRuntime,
}

impl DiscoveryError {
    /// Create a new "invalid pattern" error.
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a new "module unreadable" error.
    pub fn module_unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ModuleUnreadable {
            path: path.into(),
            source,
        }
    }
}
