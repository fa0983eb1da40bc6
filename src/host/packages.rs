//! Package primitives backed by the system package manager

use declarative::{InstallState, PackageError, PackageManager, QueryError};
use pkgkit::{Client, RetryConfig};

/// [`PackageManager`] over a pkgkit client
///
/// Installs and removals retry transient failures (lock contention,
/// mirror timeouts); queries do not.
pub struct SystemPackages {
    client: Client,
    retry: RetryConfig,
}

impl SystemPackages {
    pub fn new(client: Client, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    pub fn kind(&self) -> pkgkit::PackageManagerKind {
        self.client.kind()
    }
}

/// Failure text kept for the run result, with advice for the operator
fn describe(err: &pkgkit::Error) -> String {
    let category = err.category();
    match category {
        pkgkit::ErrorCategory::Other => err.to_string(),
        _ => format!("{err} ({})", category.advice()),
    }
}

impl PackageManager for SystemPackages {
    fn query_installed(&self, name: &str) -> Result<InstallState, QueryError> {
        match self.client.installed_version(name) {
            Ok(Some(version)) => Ok(InstallState::Installed {
                version: Some(version),
            }),
            Ok(None) => Ok(InstallState::NotInstalled),
            Err(e) => Err(QueryError::Package {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn ensure_installed(&self, name: &str) -> Result<(), PackageError> {
        self.client
            .install_with_retry(name, &self.retry)
            .map_err(|e| PackageError::new(name, describe(&e)))
    }

    fn ensure_absent(&self, name: &str) -> Result<(), PackageError> {
        self.client
            .uninstall_with_retry(name, &self.retry)
            .map_err(|e| PackageError::new(name, describe(&e)))
    }
}
