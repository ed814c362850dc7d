//! Error types shared by every formstore layer.

use std::io;
use std::path::{Path, PathBuf};

/// Errors reported by descriptors and stores.
///
/// Callers are expected to tell "no data yet" (`NotFound`) apart from a
/// malformed request (`InvalidArgument`).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An identifier or field name was empty.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The requested record, field, or file bytes do not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A disk read, write, or stat failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A writer panicked while holding a lock.
    #[error("lock poisoned: {message}")]
    LockPoisoned { message: String },

    /// The supplied configuration cannot be used.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout formstore.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Like [`Error::io`], but a missing path is reported as `NotFound` so
    /// absent bytes read the same as an absent record.
    pub fn io_or_not_found(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return Error::not_found(format!("file {}", path.display()));
        }
        Error::io(path, source)
    }

    pub fn lock_poisoned(message: impl std::fmt::Display) -> Self {
        Error::LockPoisoned {
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }
}
