//! Desired resources
//!
//! A resource is a named unit of desired state. Each kind is a variant of
//! [`DesiredResource`]; the comparator and enforcer match on the variant
//! instead of dispatching through a trait object.

use crate::error::{Error, Result};
use crate::types::{Ensure, FileEnsure};
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Definition of "correct content" for a managed file
///
/// The comparator and any acceptance check share this one definition.
#[derive(Debug, Clone)]
pub enum ContentSpec {
    /// Correct when at least one line matches `pattern`
    Pattern { rendered: String, pattern: Regex },
    /// Correct when byte-equal to `rendered`
    Exact { rendered: String },
}

impl ContentSpec {
    /// Build a pattern spec; `rendered` must satisfy `pattern` itself
    pub fn pattern(id: &str, rendered: impl Into<String>, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| Error::InvalidContent {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        let spec = Self::Pattern {
            rendered: rendered.into(),
            pattern,
        };
        if !spec.is_satisfied_by(spec.rendered()) {
            return Err(Error::InvalidContent {
                id: id.to_string(),
                reason: "rendered content does not match its own pattern".to_string(),
            });
        }
        Ok(spec)
    }

    /// Build an exact-match spec
    pub fn exact(rendered: impl Into<String>) -> Self {
        Self::Exact {
            rendered: rendered.into(),
        }
    }

    /// Content written when the file has to be (re)created
    pub fn rendered(&self) -> &str {
        match self {
            Self::Pattern { rendered, .. } | Self::Exact { rendered } => rendered,
        }
    }

    /// Check observed content against this spec
    ///
    /// Pattern specs are matched line by line, so `^` and `$` anchor to
    /// line boundaries regardless of the regex flags.
    pub fn is_satisfied_by(&self, content: &str) -> bool {
        match self {
            Self::Pattern { pattern, .. } => content.lines().any(|line| pattern.is_match(line)),
            Self::Exact { rendered } => content == rendered,
        }
    }
}

impl PartialEq for ContentSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Pattern {
                    rendered: a,
                    pattern: pa,
                },
                Self::Pattern {
                    rendered: b,
                    pattern: pb,
                },
            ) => a == b && pa.as_str() == pb.as_str(),
            (Self::Exact { rendered: a }, Self::Exact { rendered: b }) => a == b,
            _ => false,
        }
    }
}

impl Eq for ContentSpec {}

impl Serialize for ContentSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ContentSpec", 3)?;
        match self {
            Self::Pattern { rendered, pattern } => {
                state.serialize_field("match", "pattern")?;
                state.serialize_field("rendered", rendered)?;
                state.serialize_field("pattern", pattern.as_str())?;
            }
            Self::Exact { rendered } => {
                state.serialize_field("match", "exact")?;
                state.serialize_field("rendered", rendered)?;
                state.skip_field("pattern")?;
            }
        }
        state.end()
    }
}

/// A package that must be installed (or absent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageResource {
    pub name: String,
    pub ensure: Ensure,
}

impl PackageResource {
    pub fn installed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ensure: Ensure::Installed,
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ensure: Ensure::Absent,
        }
    }
}

/// Attributes applied when a file is written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileAttributes {
    /// Permission bits (e.g., `0o440`)
    pub mode: Option<u32>,
    pub owner: Option<String>,
    pub group: Option<String>,
    /// Command that must accept the new content before it replaces the
    /// target; `{}` is replaced by the path of the staged file
    pub validate_cmd: Option<String>,
}

/// A file with managed content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResource {
    pub path: PathBuf,
    pub ensure: FileEnsure,
    pub content: ContentSpec,
    pub attributes: FileAttributes,
}

impl FileResource {
    /// A file that must exist with the given content
    pub fn present(path: impl Into<PathBuf>, content: ContentSpec) -> Self {
        Self {
            path: path.into(),
            ensure: FileEnsure::Present,
            content,
            attributes: FileAttributes::default(),
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.attributes.mode = Some(mode);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>, group: impl Into<String>) -> Self {
        self.attributes.owner = Some(owner.into());
        self.attributes.group = Some(group.into());
        self
    }

    pub fn with_validate_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.attributes.validate_cmd = Some(cmd.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A named unit of desired state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DesiredResource {
    Package(PackageResource),
    File(FileResource),
}

impl DesiredResource {
    /// Unique identifier for this resource
    ///
    /// Stable across runs. Examples:
    /// - "package:ivanti-base-agent"
    /// - "file:/etc/sudoers.d/10_landesk"
    pub fn id(&self) -> String {
        match self {
            Self::Package(p) => format!("package:{}", p.name),
            Self::File(f) => format!("file:{}", f.path.display()),
        }
    }

    /// Resource type category, used for grouping and filtering
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Package(_) => "package",
            Self::File(_) => "file",
        }
    }

    /// Human-readable description of what this resource does
    pub fn description(&self) -> String {
        match self {
            Self::Package(p) => match p.ensure {
                Ensure::Installed => format!("Install package {}", p.name),
                Ensure::Absent => format!("Remove package {}", p.name),
            },
            Self::File(f) => match f.ensure {
                FileEnsure::Present => format!("Manage file {}", f.path.display()),
                FileEnsure::Absent => format!("Remove file {}", f.path.display()),
            },
        }
    }

    /// Short name without the type prefix
    pub fn name(&self) -> String {
        match self {
            Self::Package(p) => p.name.clone(),
            Self::File(f) => f.path.display().to_string(),
        }
    }
}

impl From<PackageResource> for DesiredResource {
    fn from(resource: PackageResource) -> Self {
        Self::Package(resource)
    }
}

impl From<FileResource> for DesiredResource {
    fn from(resource: FileResource) -> Self {
        Self::File(resource)
    }
}

impl fmt::Display for DesiredResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULE: &str = r"^landesk[ \t]+ALL=\(ALL\)[ \t]+NOPASSWD:[ \t]+ALL$";

    fn spec() -> ContentSpec {
        ContentSpec::pattern("file:test", "landesk ALL=(ALL) NOPASSWD: ALL\n", RULE).unwrap()
    }

    #[test]
    fn test_pattern_matches_any_line() {
        let spec = spec();
        assert!(spec.is_satisfied_by("# managed\nlandesk ALL=(ALL)  NOPASSWD: ALL\n"));
        assert!(spec.is_satisfied_by("landesk\tALL=(ALL)\tNOPASSWD:\tALL"));
        assert!(spec.is_satisfied_by("# managed\r\nlandesk ALL=(ALL) NOPASSWD: ALL\r\n"));
    }

    #[test]
    fn test_pattern_rejects_drift() {
        let spec = spec();
        assert!(!spec.is_satisfied_by(""));
        assert!(!spec.is_satisfied_by("landesk ALL=(ALL) ALL\n"));
        assert!(!spec.is_satisfied_by("# landesk ALL=(ALL) NOPASSWD: ALL\n"));
        assert!(!spec.is_satisfied_by("landesk ALL=(ALL) NOPASSWD: ALL, !/bin/sh\n"));
        assert!(!spec.is_satisfied_by("landeskALL=(ALL) NOPASSWD: ALL\n"));
    }

    #[test]
    fn test_pattern_does_not_span_lines() {
        assert!(!spec().is_satisfied_by("landesk\nALL=(ALL) NOPASSWD: ALL\n"));
    }

    #[test]
    fn test_pattern_must_match_its_rendering() {
        let err = ContentSpec::pattern("file:test", "nobody ALL=(ALL) ALL\n", RULE).unwrap_err();
        assert!(matches!(err, Error::InvalidContent { .. }));
    }

    #[test]
    fn test_invalid_regex() {
        let err = ContentSpec::pattern("file:test", "x", "(").unwrap_err();
        assert!(matches!(err, Error::InvalidContent { .. }));
    }

    #[test]
    fn test_exact() {
        let spec = ContentSpec::exact("a\n");
        assert!(spec.is_satisfied_by("a\n"));
        assert!(!spec.is_satisfied_by("a"));
        assert_ne!(spec, ContentSpec::exact("b\n"));
    }

    #[test]
    fn test_ids() {
        let pkg: DesiredResource = PackageResource::installed("ivanti-pds2").into();
        assert_eq!(pkg.id(), "package:ivanti-pds2");
        assert_eq!(pkg.resource_type(), "package");

        let file: DesiredResource =
            FileResource::present("/etc/sudoers.d/10_landesk", spec()).into();
        assert_eq!(file.id(), "file:/etc/sudoers.d/10_landesk");
        assert_eq!(file.name(), "/etc/sudoers.d/10_landesk");
    }

    #[test]
    fn test_serialize_file_resource() {
        let file: DesiredResource = FileResource::present("/etc/sudoers.d/10_landesk", spec())
            .with_mode(0o440)
            .into();
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["content"]["match"], "pattern");
        assert_eq!(json["attributes"]["mode"], 0o440);
    }
}
