use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read; callers fall back to defaults.
    #[error("Storage unavailable at {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A line or entry was skipped; the rest of the file is still used.
    #[error("Malformed record at {location}: {reason}")]
    Malformed { location: String, reason: String },
    /// Nothing on disk was replaced; the in-memory state is still valid.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
