//! Error types for reconciliation.
//!
//! Two scopes are kept apart:
//! - [`Error`] is catalog-level. It aborts a run before anything is enforced.
//! - [`QueryError`], [`PackageError`] and [`FsError`] are resource-level. They
//!   are recorded against a single resource and the run moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Catalog-level errors. Any of these is fatal for the whole run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The facts describe a platform the catalog does not cover
    #[error("unsupported platform: {os_family} {os_version}")]
    UnsupportedPlatform {
        /// Operating system family from the facts
        os_family: String,
        /// Operating system version from the facts
        os_version: String,
    },

    /// Two resources share the same identity
    #[error("duplicate resource in catalog: {id}")]
    DuplicateResource {
        /// Identity of the resource added twice
        id: String,
    },

    /// Facts are missing required values
    #[error("invalid facts: {reason}")]
    InvalidFacts {
        /// What is wrong with the facts
        reason: String,
    },

    /// A content specification can never be satisfied by its own rendering
    #[error("invalid content for {id}: {reason}")]
    InvalidContent {
        /// Resource the content belongs to
        id: String,
        /// Why the content is rejected
        reason: String,
    },
}

/// The observed state of a resource could not be determined.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The package manager could not answer for a package
    #[error("could not query package {name}: {reason}")]
    Package {
        /// Package name
        name: String,
        /// Underlying failure
        reason: String,
    },

    /// The file could not be inspected
    #[error("could not inspect {}: {source}", path.display())]
    File {
        /// Path being inspected
        path: PathBuf,
        /// Underlying failure
        source: FsError,
    },
}

/// The package manager failed to converge a package.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("package {name}: {reason}")]
pub struct PackageError {
    /// Package name
    pub name: String,
    /// Underlying failure, preserved for the caller
    pub reason: String,
}

impl PackageError {
    /// Create a package error
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Filesystem primitive failures.
#[derive(Debug, Error)]
pub enum FsError {
    /// The path does not exist
    #[error("{} does not exist", path.display())]
    NotFound {
        /// Missing path
        path: PathBuf,
    },

    /// I/O failure on a path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The new content was rejected by its validation command
    #[error("validation of {} failed: {reason}", path.display())]
    Validation {
        /// Path whose content was rejected
        path: PathBuf,
        /// Validator output
        reason: String,
    },

    /// Ownership could not be applied
    #[error("could not set owner of {} to {owner}: {reason}", path.display())]
    Ownership {
        /// Path being chowned
        path: PathBuf,
        /// Requested owner
        owner: String,
        /// Underlying failure
        reason: String,
    },
}

impl FsError {
    /// Build an error from an I/O error, mapping `NotFound` to [`FsError::NotFound`]
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Whether this error means the path is simply absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for catalog-level operations.
pub type Result<T> = std::result::Result<T, Error>;
