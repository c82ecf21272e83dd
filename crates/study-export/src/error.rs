//! Export errors

use std::path::PathBuf;

/// Failure writing an export file
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Export directory could not be created
    #[error("cannot create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File could not be written
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Path the failed operation targeted
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::CreateDir { path, .. } | Self::Write { path, .. } => path,
        }
    }
}
