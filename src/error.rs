//! Error types shared across the organizing pipeline.

use crate::transfer::TransferError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that stop a run (or, with failure isolation, a single file).
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The source tree could not be walked.
    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A file could not be read to completion while fingerprinting it.
    #[error("Failed to fingerprint {}: {source}", path.display())]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be relocated into the archive.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl OrganizeError {
    /// Returns the source file this error concerns, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Walk { path, .. } | Self::Fingerprint { path, .. } => Some(path),
            Self::Transfer(err) => Some(err.source_path()),
        }
    }
}

/// Result type for organizing operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
