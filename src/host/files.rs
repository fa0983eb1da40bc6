//! Filesystem primitives backed by the real filesystem

use crate::runner;
use declarative::{FileAttributes, FileSystem, FsError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filesystem rooted at a prefix
///
/// Resource paths are absolute host paths; they are resolved under `root`
/// so a run can be pointed at a staging tree. Writes are atomic: the new
/// content is staged in a sibling temp file, validated and chowned, then
/// renamed over the target.
#[derive(Debug, Clone)]
pub struct HostFs {
    root: PathBuf,
    apply_ownership: bool,
}

impl HostFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            apply_ownership: true,
        }
    }

    /// Skip `chown`, for staging trees owned by an unprivileged user
    pub fn without_ownership(mut self) -> Self {
        self.apply_ownership = false;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a host path lives under this root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path.strip_prefix("/").unwrap_or(path))
    }

    fn validate(&self, path: &Path, staged: &Path, cmd: &str) -> Result<(), FsError> {
        let validation_error = |reason: String| FsError::Validation {
            path: path.to_path_buf(),
            reason,
        };

        let (program, _) = runner::expand_template(cmd, "")
            .ok_or_else(|| validation_error("empty validation command".to_string()))?;
        if !runner::command_exists(&program) {
            return Err(validation_error(format!("{program} is not installed")));
        }

        runner::run_template(cmd, &staged.to_string_lossy())
            .map(|_| ())
            .map_err(|e| validation_error(e.to_string()))
    }

    fn chown(&self, path: &Path, staged: &Path, attributes: &FileAttributes) -> Result<(), FsError> {
        let Some(owner) = attributes.owner.as_deref() else {
            return Ok(());
        };
        let spec = match attributes.group.as_deref() {
            Some(group) => format!("{owner}:{group}"),
            None => owner.to_string(),
        };
        let staged = staged.to_string_lossy();
        runner::run_capture("chown", &[spec.as_str(), staged.as_ref()])
            .map(|_| ())
            .map_err(|e| FsError::Ownership {
                path: path.to_path_buf(),
                owner: spec.clone(),
                reason: e.to_string(),
            })
    }
}

impl Default for HostFs {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(unix)]
fn set_mode(file: &fs::File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &fs::File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

impl FileSystem for HostFs {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        fs::read(self.resolve(path)).map_err(|e| FsError::from_io(path, e))
    }

    #[cfg(unix)]
    fn file_mode(&self, path: &Path) -> Result<Option<u32>, FsError> {
        use std::os::unix::fs::PermissionsExt;
        match fs::metadata(self.resolve(path)) {
            Ok(meta) => Ok(Some(meta.permissions().mode() & 0o7777)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FsError::from_io(path, e)),
        }
    }

    fn write_file(
        &self,
        path: &Path,
        content: &[u8],
        attributes: &FileAttributes,
    ) -> Result<(), FsError> {
        let target = self.resolve(path);
        let io_error = |e| FsError::from_io(path, e);

        let parent = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(io_error)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".ivanti-agent")
            .tempfile_in(parent)
            .map_err(io_error)?;
        staged.write_all(content).map_err(io_error)?;
        staged.as_file().sync_all().map_err(io_error)?;
        if let Some(mode) = attributes.mode {
            set_mode(staged.as_file(), mode).map_err(io_error)?;
        }

        if let Some(cmd) = attributes.validate_cmd.as_deref() {
            // Dropping `staged` removes it, leaving the target untouched
            self.validate(path, staged.path(), cmd)?;
        }

        // Ownership goes on the staged file so a failed chown never
        // reaches the target
        if self.apply_ownership {
            self.chown(path, staged.path(), attributes)?;
        }

        staged
            .persist(&target)
            .map_err(|e| FsError::from_io(path, e.error))?;
        log::debug!("wrote {}", target.display());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(self.resolve(path)).map_err(|e| FsError::from_io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PATH: &str = "/etc/sudoers.d/10_landesk";

    fn staging() -> (TempDir, HostFs) {
        let dir = TempDir::new().unwrap();
        let fs = HostFs::new(dir.path()).without_ownership();
        (dir, fs)
    }

    #[test]
    fn test_resolve_under_root() {
        let fs = HostFs::new("/srv/stage");
        assert_eq!(
            fs.resolve(Path::new(PATH)),
            PathBuf::from("/srv/stage/etc/sudoers.d/10_landesk")
        );
        assert_eq!(HostFs::default().resolve(Path::new(PATH)), PathBuf::from(PATH));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_dir, fs) = staging();
        assert!(fs.read_file(Path::new(PATH)).unwrap_err().is_not_found());
        assert_eq!(fs.file_mode(Path::new(PATH)).unwrap(), None);
    }

    #[test]
    fn test_write_creates_parent_and_applies_mode() {
        let (dir, fs) = staging();
        let attrs = FileAttributes {
            mode: Some(0o440),
            ..Default::default()
        };
        fs.write_file(Path::new(PATH), b"landesk ALL=(ALL) NOPASSWD: ALL\n", &attrs)
            .unwrap();

        assert_eq!(
            fs.read_file(Path::new(PATH)).unwrap(),
            b"landesk ALL=(ALL) NOPASSWD: ALL\n"
        );
        #[cfg(unix)]
        assert_eq!(fs.file_mode(Path::new(PATH)).unwrap(), Some(0o440));

        // No staged files left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("etc/sudoers.d"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_replaces_existing_content() {
        let (_dir, fs) = staging();
        let attrs = FileAttributes::default();
        fs.write_file(Path::new(PATH), b"old\n", &attrs).unwrap();
        fs.write_file(Path::new(PATH), b"new\n", &attrs).unwrap();
        assert_eq!(fs.read_file(Path::new(PATH)).unwrap(), b"new\n");
    }

    #[test]
    fn test_rejected_validation_leaves_target_untouched() {
        let (dir, fs) = staging();
        fs.write_file(Path::new(PATH), b"original\n", &FileAttributes::default())
            .unwrap();

        let attrs = FileAttributes {
            validate_cmd: Some("false {}".to_string()),
            ..Default::default()
        };
        let err = fs
            .write_file(Path::new(PATH), b"broken\n", &attrs)
            .unwrap_err();

        assert!(matches!(err, FsError::Validation { .. }));
        assert_eq!(fs.read_file(Path::new(PATH)).unwrap(), b"original\n");
        let entries = std::fs::read_dir(dir.path().join("etc/sudoers.d"))
            .unwrap()
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_failed_chown_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let fs = HostFs::new(dir.path());
        fs.write_file(Path::new(PATH), b"old\n", &FileAttributes::default())
            .unwrap();

        let attrs = FileAttributes {
            owner: Some("no-such-user-ivanti".to_string()),
            ..Default::default()
        };
        let err = fs.write_file(Path::new(PATH), b"new\n", &attrs).unwrap_err();

        assert!(matches!(err, FsError::Ownership { .. }));
        assert_eq!(fs.read_file(Path::new(PATH)).unwrap(), b"old\n");
        let entries = std::fs::read_dir(dir.path().join("etc/sudoers.d"))
            .unwrap()
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_validator_sees_staged_content() {
        let (_dir, fs) = staging();
        let attrs = FileAttributes {
            validate_cmd: Some("grep -q NOPASSWD {}".to_string()),
            ..Default::default()
        };
        assert!(
            fs.write_file(Path::new(PATH), b"landesk ALL=(ALL) NOPASSWD: ALL\n", &attrs)
                .is_ok()
        );
        assert!(
            fs.write_file(Path::new(PATH), b"landesk ALL=(ALL) ALL\n", &attrs)
                .is_err()
        );
    }

    #[test]
    fn test_missing_validator_refuses_write() {
        let (_dir, fs) = staging();
        let attrs = FileAttributes {
            validate_cmd: Some("no-such-validator-xyz -c {}".to_string()),
            ..Default::default()
        };
        let err = fs.write_file(Path::new(PATH), b"x\n", &attrs).unwrap_err();
        assert!(err.to_string().contains("not installed"));
        assert!(fs.read_file(Path::new(PATH)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove_file() {
        let (_dir, fs) = staging();
        fs.write_file(Path::new(PATH), b"x\n", &FileAttributes::default())
            .unwrap();
        fs.remove_file(Path::new(PATH)).unwrap();
        assert!(fs.remove_file(Path::new(PATH)).unwrap_err().is_not_found());
    }
}
