//! In-memory host
//!
//! Implements [`PackageManager`] and [`FileSystem`] over plain maps, with
//! failure injection. Useful for tests and for simulating a host.

use crate::context::{FileSystem, PackageManager};
use crate::error::{FsError, PackageError, QueryError};
use crate::resource::FileAttributes;
use crate::types::InstallState;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

const DEFAULT_MODE: u32 = 0o644;

#[derive(Debug, Default)]
struct State {
    packages: HashMap<String, Option<String>>,
    files: HashMap<PathBuf, (Vec<u8>, u32)>,
    install_failures: HashMap<String, String>,
    query_failures: HashSet<String>,
    read_failures: HashSet<PathBuf>,
    write_failures: HashMap<PathBuf, String>,
    mutating_calls: usize,
}

/// Host state held in memory
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

impl MemoryHost {
    /// Create a clean host: no packages, no files
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a package as installed
    pub fn install(&self, name: &str) {
        self.state().packages.insert(name.to_string(), None);
    }

    /// Simulate a package removed behind our back
    pub fn remove_package(&self, name: &str) {
        self.state().packages.remove(name);
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.state().packages.contains_key(name)
    }

    /// Place a file on the host
    pub fn put_file(&self, path: impl Into<PathBuf>, content: &str, mode: u32) {
        self.state()
            .files
            .insert(path.into(), (content.as_bytes().to_vec(), mode));
    }

    /// Simulate a file deleted behind our back
    pub fn delete_file(&self, path: impl AsRef<Path>) {
        self.state().files.remove(path.as_ref());
    }

    pub fn content_of(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state()
            .files
            .get(path.as_ref())
            .map(|(bytes, _)| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn file_mode_of(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.state().files.get(path.as_ref()).map(|(_, mode)| *mode)
    }

    /// Make installs of a package fail with `reason`
    pub fn fail_install(&self, name: &str, reason: &str) {
        self.state()
            .install_failures
            .insert(name.to_string(), reason.to_string());
    }

    /// Make queries for a package fail
    pub fn fail_query(&self, name: &str) {
        self.state().query_failures.insert(name.to_string());
    }

    /// Make reads of a path fail with a permission error
    pub fn fail_read(&self, path: impl Into<PathBuf>) {
        self.state().read_failures.insert(path.into());
    }

    /// Make writes to a path fail with `reason`
    pub fn fail_write(&self, path: impl Into<PathBuf>, reason: &str) {
        self.state()
            .write_failures
            .insert(path.into(), reason.to_string());
    }

    /// Number of mutating primitive calls issued so far, failed ones included
    pub fn mutating_calls(&self) -> usize {
        self.state().mutating_calls
    }
}

impl PackageManager for MemoryHost {
    fn query_installed(&self, name: &str) -> Result<InstallState, QueryError> {
        let state = self.state();
        if state.query_failures.contains(name) {
            return Err(QueryError::Package {
                name: name.to_string(),
                reason: "package database is locked".to_string(),
            });
        }
        Ok(match state.packages.get(name) {
            Some(version) => InstallState::Installed {
                version: version.clone(),
            },
            None => InstallState::NotInstalled,
        })
    }

    fn ensure_installed(&self, name: &str) -> Result<(), PackageError> {
        let mut state = self.state();
        state.mutating_calls += 1;
        if let Some(reason) = state.install_failures.get(name) {
            return Err(PackageError::new(name, reason.clone()));
        }
        state.packages.insert(name.to_string(), None);
        Ok(())
    }

    fn ensure_absent(&self, name: &str) -> Result<(), PackageError> {
        let mut state = self.state();
        state.mutating_calls += 1;
        state.packages.remove(name);
        Ok(())
    }
}

impl FileSystem for MemoryHost {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let state = self.state();
        if state.read_failures.contains(path) {
            return Err(FsError::from_io(
                path,
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }
        state
            .files
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn file_mode(&self, path: &Path) -> Result<Option<u32>, FsError> {
        Ok(self.state().files.get(path).map(|(_, mode)| *mode))
    }

    fn write_file(
        &self,
        path: &Path,
        content: &[u8],
        attributes: &FileAttributes,
    ) -> Result<(), FsError> {
        let mut state = self.state();
        state.mutating_calls += 1;
        if let Some(reason) = state.write_failures.get(path) {
            return Err(FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other(reason.clone()),
            });
        }
        let mode = attributes.mode.unwrap_or(DEFAULT_MODE);
        state
            .files
            .insert(path.to_path_buf(), (content.to_vec(), mode));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state();
        state.mutating_calls += 1;
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })
    }
}
