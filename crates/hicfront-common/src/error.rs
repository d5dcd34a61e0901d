//! Error types for hicfront

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for hicfront operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Fatal build error.
///
/// Anything surfacing as a `BuildError` aborts the task that raised it and is
/// reported through the process exit status. Per-file compile failures are not
/// `BuildError`s; they travel as diagnostics in a pipeline report instead.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source directory not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Vendor package `{name}` not found at {}", path.display())]
    VendorPackageMissing { name: String, path: PathBuf },

    #[error("Invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Package metadata error: {0}")]
    Metadata(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task graph error: {0}")]
    Graph(String),
}

impl BuildError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns true if this error came from the filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, BuildError::Io { .. } | BuildError::SourceMissing(_))
    }
}
