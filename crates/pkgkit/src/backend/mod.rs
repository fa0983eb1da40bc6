//! Backend abstraction for system package managers.
//!
//! The [`Backend`] trait defines the interface for interacting with the
//! host's package manager, allowing for different implementations (rpm
//! family, dpkg family, mock for testing).

pub mod dpkg;
pub mod rpm;

use crate::error::{Error, Result};
use crate::types::PackageManagerKind;
use std::process::{Command, Output};

/// Backend trait for package manager operations.
///
/// Installs and removals must be non-interactive: a backend never waits
/// for a confirmation prompt.
pub trait Backend: Send + Sync {
    /// Which package manager this backend drives.
    fn kind(&self) -> PackageManagerKind;

    /// Check if the package manager is usable.
    fn is_available(&self) -> bool;

    /// Installed version of a package, `None` when it is not installed.
    fn is_installed(&self, name: &str) -> Result<Option<String>>;

    /// Install a package.
    fn install(&self, name: &str) -> Result<()>;

    /// Uninstall a package.
    fn uninstall(&self, name: &str) -> Result<()>;
}

/// Detect the package manager of this host.
///
/// Kinds are probed in [`PackageManagerKind::ALL`] order, so a host that
/// ships both dnf and a yum compatibility shim is driven through dnf.
pub fn detect() -> Result<PackageManagerKind> {
    PackageManagerKind::ALL
        .into_iter()
        .find(|kind| find_executable(kind.executable()).is_some())
        .ok_or(Error::ManagerNotFound)
}

/// Build the backend for a package manager kind.
pub fn for_kind(kind: PackageManagerKind) -> Result<Box<dyn Backend>> {
    let executable = find_executable(kind.executable()).ok_or(Error::ManagerNotFound)?;
    log::debug!("using {kind} at {executable}");
    Ok(if kind.is_rpm() {
        Box::new(rpm::RpmBackend::new(kind, executable))
    } else {
        Box::new(dpkg::DpkgBackend::new(executable))
    })
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<String> {
    let output = Command::new("which").arg(name).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then_some(path)
}

/// Environment for a package manager invocation.
///
/// Output is parsed as English text, so the C locale is forced and
/// cannot be overridden by the caller.
pub fn command_env<'a>(envs: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    envs.iter()
        .copied()
        .filter(|(key, _)| *key != "LC_ALL" && *key != "LANGUAGE")
        .chain([("LC_ALL", "C"), ("LANGUAGE", "C")])
        .collect()
}

/// Run a command and return its raw output.
pub(crate) fn run(program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
    log::debug!("running {program} {}", args.join(" "));
    Command::new(program)
        .args(args)
        .envs(command_env(envs))
        .output()
        .map_err(|e| Error::CommandFailed {
            message: format!("failed to execute {program}: {e}"),
            stderr: String::new(),
        })
}

/// Run a command and categorize a non-zero exit.
pub(crate) fn run_checked(
    program: &str,
    args: &[&str],
    envs: &[(&str, &str)],
    package_name: Option<&str>,
) -> Result<String> {
    let output = run(program, args, envs)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // zypper and yum report some failures on stdout only
        let detail = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout)
        } else {
            stderr
        };
        return Err(Error::from_output(&detail, package_name));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
