//! Error types for the virtual filesystem bridge.

use thiserror::Error;

/// Errors raised while staging or retrieving engine files.
#[derive(Debug, Error)]
pub enum FsError {
    /// Writing a file (or creating one of its directories) failed.
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading a file failed, usually because it does not exist.
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Removing a file failed. Only ever logged.
    #[error("Failed to delete {path}: {source}")]
    DeleteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The path is empty or names a directory.
    #[error("Invalid engine path: {path}")]
    InvalidPath { path: String },
}

impl FsError {
    /// The virtual path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::WriteFailed { path, .. }
            | Self::ReadFailed { path, .. }
            | Self::DeleteFailed { path, .. }
            | Self::InvalidPath { path } => path,
        }
    }

    /// Whether the underlying cause was a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::WriteFailed { source, .. }
            | Self::ReadFailed { source, .. }
            | Self::DeleteFailed { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::InvalidPath { .. } => false,
        }
    }
}
