//! Backend for rpm-based hosts driven through dnf, yum or zypper.

use crate::backend::{Backend, run, run_checked};
use crate::error::{Error, Result};
use crate::types::PackageManagerKind;

/// Query format for `rpm -q`, yields `version-release`.
const QUERY_FORMAT: &str = "%{VERSION}-%{RELEASE}";

/// Backend that queries the rpm database and mutates through the front end.
pub struct RpmBackend {
    kind: PackageManagerKind,
    executable: String,
}

impl RpmBackend {
    /// Create a backend for an rpm-family front end at `executable`.
    pub fn new(kind: PackageManagerKind, executable: impl Into<String>) -> Self {
        Self {
            kind,
            executable: executable.into(),
        }
    }
}

/// Arguments for a non-interactive install.
pub fn install_args(kind: PackageManagerKind, name: &str) -> Vec<&str> {
    match kind {
        PackageManagerKind::Zypper => vec!["--non-interactive", "install", name],
        _ => vec!["install", "-y", name],
    }
}

/// Arguments for a non-interactive removal.
pub fn uninstall_args(kind: PackageManagerKind, name: &str) -> Vec<&str> {
    match kind {
        PackageManagerKind::Zypper => vec!["--non-interactive", "remove", name],
        _ => vec!["remove", "-y", name],
    }
}

/// Interpret `rpm -q --qf` output.
///
/// rpm exits 1 and prints "package X is not installed" for a missing
/// package; any other failure is an error.
pub fn parse_query(success: bool, stdout: &str, stderr: &str, name: &str) -> Result<Option<String>> {
    if success {
        // Multilib hosts may list several instances; the first is enough
        let version = stdout.lines().next().unwrap_or_default().trim();
        return Ok((!version.is_empty()).then(|| version.to_string()));
    }
    if stdout.contains("is not installed") {
        return Ok(None);
    }
    Err(Error::CommandFailed {
        message: format!("rpm query failed for {name}"),
        stderr: stderr.trim().to_string(),
    })
}

impl Backend for RpmBackend {
    fn kind(&self) -> PackageManagerKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        run(&self.executable, &["--version"], &[]).is_ok_and(|o| o.status.success())
    }

    fn is_installed(&self, name: &str) -> Result<Option<String>> {
        let output = run("rpm", &["-q", "--qf", QUERY_FORMAT, name], &[])?;
        parse_query(
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
            name,
        )
    }

    fn install(&self, name: &str) -> Result<()> {
        run_checked(&self.executable, &install_args(self.kind, name), &[], Some(name))?;
        Ok(())
    }

    fn uninstall(&self, name: &str) -> Result<()> {
        run_checked(&self.executable, &uninstall_args(self.kind, name), &[], Some(name))?;
        Ok(())
    }
}
