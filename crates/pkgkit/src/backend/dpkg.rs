//! Backend for Debian-family hosts: dpkg-query for state, apt-get to mutate.

use crate::backend::{Backend, run, run_checked};
use crate::error::{Error, Result};
use crate::types::PackageManagerKind;

const QUERY_FORMAT: &str = "${Status} ${Version}";
const NONINTERACTIVE: [(&str, &str); 1] = [("DEBIAN_FRONTEND", "noninteractive")];

/// Backend that drives `apt-get`.
pub struct DpkgBackend {
    executable: String,
}

impl DpkgBackend {
    /// Create a backend for `apt-get` at `executable`.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

/// Interpret `dpkg-query -W -f='${Status} ${Version}'` output.
///
/// A package that was removed but kept its config files is still known to
/// dpkg; only `install ok installed` counts as installed.
pub fn parse_query(success: bool, stdout: &str, stderr: &str, name: &str) -> Result<Option<String>> {
    if !success {
        if stderr.contains("no packages found matching") {
            return Ok(None);
        }
        return Err(Error::CommandFailed {
            message: format!("dpkg-query failed for {name}"),
            stderr: stderr.trim().to_string(),
        });
    }

    let line = stdout.lines().next().unwrap_or_default().trim();
    let mut fields = line.split_whitespace();
    let status: Vec<&str> = fields.by_ref().take(3).collect();
    if status != ["install", "ok", "installed"] {
        return Ok(None);
    }
    Ok(fields.next().map(str::to_string))
}

impl Backend for DpkgBackend {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Apt
    }

    fn is_available(&self) -> bool {
        run(&self.executable, &["--version"], &[]).is_ok_and(|o| o.status.success())
    }

    fn is_installed(&self, name: &str) -> Result<Option<String>> {
        let output = run("dpkg-query", &["-W", "-f", QUERY_FORMAT, name], &[])?;
        parse_query(
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
            name,
        )
    }

    fn install(&self, name: &str) -> Result<()> {
        run_checked(
            &self.executable,
            &["install", "-y", name],
            &NONINTERACTIVE,
            Some(name),
        )?;
        Ok(())
    }

    fn uninstall(&self, name: &str) -> Result<()> {
        run_checked(
            &self.executable,
            &["remove", "-y", name],
            &NONINTERACTIVE,
            Some(name),
        )?;
        Ok(())
    }
}
