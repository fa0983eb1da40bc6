//! Provider traits for the host primitives
//!
//! These traits let the reconciliation core run without depending on a
//! specific package manager, filesystem, fact source or UI.

use crate::error::{FsError, PackageError, QueryError};
use crate::resource::FileAttributes;
use crate::types::{Facts, InstallState, Outcome, RunResult};
use anyhow::Result;
use std::path::Path;

/// Package manager primitives
pub trait PackageManager {
    /// Query the install status of a package
    fn query_installed(&self, name: &str) -> std::result::Result<InstallState, QueryError>;

    /// Install a package (no-op for the manager if already installed)
    fn ensure_installed(&self, name: &str) -> std::result::Result<(), PackageError>;

    /// Remove a package
    fn ensure_absent(&self, name: &str) -> std::result::Result<(), PackageError>;
}

/// Filesystem primitives
pub trait FileSystem {
    /// Read a file's full content; a missing file is [`FsError::NotFound`]
    fn read_file(&self, path: &Path) -> std::result::Result<Vec<u8>, FsError>;

    /// Permission bits of a file, when the filesystem can report them
    fn file_mode(&self, _path: &Path) -> std::result::Result<Option<u32>, FsError> {
        Ok(None)
    }

    /// Write the full content of a file and apply its attributes
    ///
    /// Implementations must either fully replace the file or leave it
    /// untouched and return an error.
    fn write_file(
        &self,
        path: &Path,
        content: &[u8],
        attributes: &FileAttributes,
    ) -> std::result::Result<(), FsError>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> std::result::Result<(), FsError>;
}

/// Source of host facts, consumed once at run start
pub trait FactProvider {
    fn get_facts(&self) -> Result<Facts>;
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during a run.
pub trait ProgressCallback {
    /// Called once before the first resource
    fn on_run_start(&mut self, count: usize);

    /// Called when starting to reconcile a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource reaches its outcome
    fn on_resource_complete(&mut self, id: &str, outcome: &Outcome);

    /// Called after the last resource
    fn on_run_complete(&mut self, result: &RunResult);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_run_start(&mut self, _count: usize) {}
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _outcome: &Outcome) {}
    fn on_run_complete(&mut self, _result: &RunResult) {}
}

/// Host primitives handed to the comparator and enforcer
pub struct ApplyContext<'a> {
    pub packages: &'a dyn PackageManager,
    pub files: &'a dyn FileSystem,
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(packages: &'a dyn PackageManager, files: &'a dyn FileSystem) -> Self {
        Self {
            packages,
            files,
            dry_run: false,
            verbose: false,
        }
    }

    /// Same primitives, no mutation
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
