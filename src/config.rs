//! Agent configuration (`config.toml`)
//!
//! ```toml
//! [packages]
//! manager = "dnf"          # dnf | yum | zypper | apt, detected when unset
//! retries = 2
//! retry_delay_secs = 10
//! max_retry_delay_secs = 120
//!
//! [files]
//! root = "/"
//! validate = "visudo -cf {}"
//! exact_content = false
//!
//! [run]
//! timeout_secs = 1800
//! ```

use crate::catalog::CatalogOptions;
use crate::paths;
use anyhow::{Context, Result};
use pkgkit::{PackageManagerKind, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub packages: PackagesConfig,
    pub files: FilesConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagesConfig {
    /// Package manager to drive; detected from PATH when unset
    pub manager: Option<PackageManagerKind>,
    /// Retries after the first failed attempt, for transient errors only
    pub retries: u32,
    pub retry_delay_secs: u64,
    pub max_retry_delay_secs: u64,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            manager: None,
            retries: 2,
            retry_delay_secs: 10,
            max_retry_delay_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    /// Directory host paths are resolved under
    pub root: String,
    /// Validation command for the sudoers drop-in; empty disables it
    pub validate: Option<String>,
    /// Require the drop-in to match byte for byte instead of by rule
    pub exact_content: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: "/".to_string(),
            validate: None,
            exact_content: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Deadline for a whole run; resources not started by then fail
    pub timeout_secs: Option<u64>,
}

impl AgentConfig {
    /// Load the config resolved from `--config`, the environment or the
    /// default locations. Missing file means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match paths::config_file(explicit)? {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.packages.retries.saturating_add(1),
            Duration::from_secs(self.packages.retry_delay_secs),
            2.0,
        )
        .with_max_delay(Duration::from_secs(self.packages.max_retry_delay_secs))
    }

    pub fn files_root(&self) -> PathBuf {
        paths::expand_path(&self.files.root)
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            exact_content: self.files.exact_content,
            validate_cmd: self.files.validate.clone(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.run.timeout_secs.map(Duration::from_secs)
    }
}
