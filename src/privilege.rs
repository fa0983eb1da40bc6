//! Privilege checks
//!
//! Installing packages and writing under `/etc/sudoers.d` needs root. The
//! check runs once, before anything is touched.

use anyhow::{Result, bail};
use std::path::Path;

/// Whether the effective user is root
#[cfg(unix)]
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Whether a run with these settings has to be root
///
/// A dry run never mutates, and a run against a staging root only
/// touches files under that directory.
pub fn needs_root(dry_run: bool, files_root: &Path) -> bool {
    !dry_run && files_root == Path::new("/")
}

/// Fail early when the run needs root and we are not
pub fn require_root(dry_run: bool, files_root: &Path) -> Result<()> {
    if needs_root(dry_run, files_root) && !is_root() {
        bail!("apply must run as root (use --dry-run to preview without privileges)");
    }
    Ok(())
}
