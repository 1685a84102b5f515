//! Share error types.

use std::path::PathBuf;

/// Errors produced while sharing a path.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("path doesn't exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("path is neither a file nor a directory: {}", .0.display())]
    UnsupportedEntry(PathBuf),

    #[error("could not create staging directory {identifier} after {attempts} attempts: {source}")]
    Provisioning {
        identifier: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("copy {} -> {} failed: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShareError {
    /// The message shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PathNotFound(_) => "Path doesn't exist!",
            Self::UnsupportedEntry(_) => "Path is neither a file nor a directory!",
            Self::Provisioning { .. } => "Could not create temporary directory for sharing",
            Self::Copy { .. } => "Not able to copy file to temporary directory",
            Self::Manifest(_) | Self::Json(_) => "Not able to write the package manifest",
            Self::Io(_) => "Not able to prepare the shared content",
        }
    }
}
