//! Error types for atomic-writer.
//!
//! All operations return `Result<T>` which aliases `Result<T, AtomicError>`.
//! Every filesystem failure keeps the underlying [`std::io::Error`] as its source.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from staging, committing or discarding a file.
#[derive(Debug, Error)]
pub enum AtomicError {
    /// Temporary directory could not be created.
    #[error("Failed to create temporary directory {path}: {source}")]
    TempDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No staging file could be allocated inside the temporary directory.
    #[error("Failed to allocate staging file in {dir}: {source}")]
    Allocate {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Durability flush of the staging file failed.
    #[error("Failed to sync {path}: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Parent directories of the destination could not be created.
    #[error("Failed to create parent directory {path}: {source}")]
    CreateParent {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Atomic rename into the destination failed.
    ///
    /// The staging file is left in place.
    #[error("Failed to rename {from} → {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Staging file could not be deleted. The handle is released regardless.
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Space reservation failed.
    #[error("Failed to preallocate {size} bytes for {path}: {source}")]
    Preallocate {
        path: PathBuf,
        size: u64,
        #[source]
        source: io::Error,
    },

    /// Not enough free space left to honour the requested reserve.
    #[error("Not enough space on disk: requested {requested} bytes, {available} available")]
    NoSpace { requested: u64, available: u64 },

    /// The staging file was already committed or discarded.
    #[error("Staging file already released")]
    Released,

    /// Write to the staging file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AtomicError {
    /// Returns the kind of the underlying I/O failure.
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::TempDir { source, .. }
            | Self::Allocate { source, .. }
            | Self::Sync { source, .. }
            | Self::CreateParent { source, .. }
            | Self::Rename { source, .. }
            | Self::Remove { source, .. }
            | Self::Preallocate { source, .. }
            | Self::Io(source) => source.kind(),
            Self::NoSpace { .. } => io::ErrorKind::StorageFull,
            Self::Released => io::ErrorKind::Other,
        }
    }
}

impl From<AtomicError> for io::Error {
    fn from(err: AtomicError) -> Self {
        match err {
            AtomicError::Io(e) => e,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}

/// Result type alias for atomic-writer operations.
pub type Result<T> = std::result::Result<T, AtomicError>;
