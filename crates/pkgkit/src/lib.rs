//! # pkgkit
//!
//! Pure Rust library for driving the system package manager.
//!
//! This crate provides functionality for:
//! - Detecting the host's package manager (dnf, yum, zypper, apt)
//! - Querying whether a package is installed, and at which version
//! - Installing and removing packages non-interactively
//! - Categorizing failures and retrying the transient ones
//!
//! ## Example
//!
//! ```no_run
//! use pkgkit::Client;
//!
//! let client = Client::detect().expect("no package manager");
//!
//! if client.installed_version("ivanti-base-agent").unwrap().is_none() {
//!     client.install("ivanti-base-agent").expect("install failed");
//! }
//! ```
//!
//! ## Retry Logic
//!
//! Lock contention and network errors are retried with exponential
//! backoff. Configure retry behavior with [`RetryConfig`].
//!
//! ```no_run
//! use pkgkit::{Client, RetryConfig};
//! use std::time::Duration;
//!
//! let client = Client::detect().unwrap();
//! let config = RetryConfig::new(3, Duration::from_secs(5), 2.0);
//! client.install_with_retry("ivanti-pds2", &config).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod retry;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{InstalledPackage, PackageManagerKind, RetryConfig};

use backend::Backend;

/// High-level client for package manager operations.
///
/// The client wraps a backend and adds retry handling on top of the
/// primitive operations.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client for the package manager found on this host.
    ///
    /// Returns an error if no supported package manager is installed.
    pub fn detect() -> Result<Self> {
        Self::for_kind(backend::detect()?)
    }

    /// Create a client for a specific package manager.
    pub fn for_kind(kind: PackageManagerKind) -> Result<Self> {
        Ok(Self {
            backend: backend::for_kind(kind)?,
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The package manager in use.
    pub fn kind(&self) -> PackageManagerKind {
        self.backend.kind()
    }

    /// Check if the package manager is usable.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Install a package.
    pub fn install(&self, name: &str) -> Result<()> {
        self.backend.install(name)
    }

    /// Install a package with retry logic, reporting retries to the log.
    pub fn install_with_retry(&self, name: &str, config: &RetryConfig) -> Result<()> {
        retry::with_retry(config, Some(&retry::LogCallback), || {
            self.backend.install(name)
        })
    }

    /// Uninstall a package.
    pub fn uninstall(&self, name: &str) -> Result<()> {
        self.backend.uninstall(name)
    }

    /// Uninstall a package with retry logic.
    pub fn uninstall_with_retry(&self, name: &str, config: &RetryConfig) -> Result<()> {
        retry::with_retry(config, Some(&retry::LogCallback), || {
            self.backend.uninstall(name)
        })
    }

    /// Check if a package is installed.
    pub fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.backend.is_installed(name)?.is_some())
    }

    /// Get the installed version of a package.
    pub fn installed_version(&self, name: &str) -> Result<Option<String>> {
        self.backend.is_installed(name)
    }

    /// Look up an installed package.
    pub fn installed(&self, name: &str) -> Result<Option<InstalledPackage>> {
        Ok(self
            .backend
            .is_installed(name)?
            .map(|version| InstalledPackage {
                name: name.to_string(),
                version,
            }))
    }
}
