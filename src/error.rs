//! Crate-wide error type.
//!
//! Storage failures are never swallowed or downgraded to defaults. Every
//! variant carries the paths involved so callers can report or recover
//! without re-deriving storage locations.

use std::io;
use std::path::PathBuf;

/// Errors produced by the storage subsystem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The project root could not be normalized to an absolute path.
    #[error("cannot resolve project root {path}: {source}")]
    PathResolution {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No centralized configuration exists and autogeneration was disabled.
    #[error("no project configuration at {expected} and autogeneration is disabled")]
    ConfigNotFound { expected: PathBuf },

    /// The on-disk configuration document failed to parse.
    #[error("malformed project configuration at {path}: {source}")]
    ConfigCorrupt {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A configuration document could not be serialized for writing.
    #[error("cannot serialize project configuration for {path}: {source}")]
    ConfigSerialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The memory name exists in neither the centralized nor the legacy tier.
    #[error("memory '{name}' not found (checked {checked:?})")]
    MemoryNotFound {
        name: String,
        checked: Vec<PathBuf>,
    },

    /// A memory name that is empty or would escape the memories directory.
    #[error("invalid memory name '{name}': names must be plain file stems")]
    InvalidMemoryName { name: String },

    /// Post-copy verification found different content at the destination.
    #[error("checksum mismatch for {path}: expected {expected}, found {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The backup archive could not be created. Migration aborts before any
    /// destination write.
    #[error("backup archive {archive} could not be created: {source}")]
    BackupFailed {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Residual filesystem failure, tagged with the operation and path.
    #[error("failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Adapter for `map_err` on `std::io` results:
/// `fs::read(&p).map_err(io("read", &p))?`.
pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
    let path = path.into();
    move |source| Error::Io { op, path, source }
}

pub type Result<T> = std::result::Result<T, Error>;
