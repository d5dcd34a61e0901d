use std::path::{Path, PathBuf};
use thiserror::Error;

/// Recoverable, per-file transform failure.
///
/// The pipeline records these as diagnostics and moves on to the next file;
/// outputs for the failing file are left as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("{}: Sass compilation failed: {message}", path.display())]
    Sass { path: PathBuf, message: String },

    #[error("{}: CSS processing failed: {message}", path.display())]
    Css { path: PathBuf, message: String },

    #[error("{}:{line}:{column}: script syntax error: {message}", path.display())]
    Script {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{}: include failed: {message}", path.display())]
    Include { path: PathBuf, message: String },

    #[error("{}: file is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
}

impl TransformError {
    /// Source file the error refers to
    pub fn path(&self) -> &Path {
        match self {
            TransformError::Sass { path, .. }
            | TransformError::Css { path, .. }
            | TransformError::Script { path, .. }
            | TransformError::Include { path, .. }
            | TransformError::Encoding { path } => path,
        }
    }
}
