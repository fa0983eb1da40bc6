//! Host fact detection
//!
//! Facts come from `/etc/os-release` and are mapped to the family names
//! configuration-management tools conventionally use (`RedHat`, `Suse`,
//! `Debian`). The command line can override either value.

use anyhow::{Context, Result};
use declarative::{FactProvider, Facts};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

pub const OS_RELEASE: &str = "/etc/os-release";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FactsError {
    #[error("os-release has no {0} field")]
    MissingField(&'static str),
}

/// Facts read from an os-release file
#[derive(Debug, Clone)]
pub struct OsReleaseFacts {
    path: PathBuf,
}

impl OsReleaseFacts {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for OsReleaseFacts {
    fn default() -> Self {
        Self::new(OS_RELEASE)
    }
}

impl FactProvider for OsReleaseFacts {
    fn get_facts(&self) -> Result<Facts> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))?;
        let facts = facts_from_os_release(&content)
            .with_context(|| format!("Invalid {}", self.path.display()))?;
        log::debug!("detected facts: {facts}");
        Ok(facts)
    }
}

/// Facts given on the command line, optionally layered over detection
pub struct StaticFacts<P> {
    inner: P,
    os_family: Option<String>,
    os_version: Option<String>,
}

impl<P: FactProvider> StaticFacts<P> {
    pub fn new(inner: P, os_family: Option<String>, os_version: Option<String>) -> Self {
        Self {
            inner,
            os_family,
            os_version,
        }
    }
}

impl<P: FactProvider> FactProvider for StaticFacts<P> {
    fn get_facts(&self) -> Result<Facts> {
        // Both overridden: the host is never consulted
        if let (Some(family), Some(version)) = (&self.os_family, &self.os_version) {
            return Ok(Facts::new(family.clone(), version.clone()));
        }

        let detected = self.inner.get_facts()?;
        Ok(Facts::new(
            self.os_family.clone().unwrap_or(detected.os_family),
            self.os_version.clone().unwrap_or(detected.os_version),
        ))
    }
}

/// Parse os-release `KEY=value` lines, unquoting values
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Map an os-release `ID` to its family, if it is a known one
pub fn family_for_id(id: &str) -> Option<&'static str> {
    match id.to_lowercase().as_str() {
        "rhel" | "centos" | "fedora" | "rocky" | "almalinux" | "ol" | "amzn" => Some("RedHat"),
        "sles" | "sled" | "suse" => Some("Suse"),
        id if id.starts_with("opensuse") => Some("Suse"),
        "debian" | "ubuntu" => Some("Debian"),
        _ => None,
    }
}

/// Derive facts from the content of an os-release file
///
/// `ID` is tried first, then each entry of `ID_LIKE`; an unknown
/// distribution keeps its raw `ID` so the catalog can reject it by name.
pub fn facts_from_os_release(content: &str) -> Result<Facts, FactsError> {
    let fields = parse_os_release(content);
    let id = fields
        .get("ID")
        .filter(|id| !id.is_empty())
        .ok_or(FactsError::MissingField("ID"))?;

    let family = std::iter::once(id.as_str())
        .chain(
            fields
                .get("ID_LIKE")
                .map(|like| like.split_whitespace().collect::<Vec<_>>())
                .unwrap_or_default(),
        )
        .find_map(family_for_id)
        .map_or_else(|| id.clone(), str::to_string);

    let version = fields
        .get("VERSION_ID")
        .filter(|v| !v.is_empty())
        .ok_or(FactsError::MissingField("VERSION_ID"))?;

    // RedHat-style majors: "8.9" is reported as "8"
    let version = if family == "RedHat" {
        version.split('.').next().unwrap_or(version).to_string()
    } else {
        version.clone()
    };

    Ok(Facts::new(family, version))
}
