//! Real host primitives
//!
//! - [`packages::SystemPackages`] drives dnf, yum, zypper or apt-get
//! - [`files::HostFs`] reads and atomically writes files under a root

pub mod files;
pub mod packages;

use crate::config::AgentConfig;
use anyhow::{Context, Result};
use files::HostFs;
use packages::SystemPackages;
use pkgkit::Client;

/// Primitives for this host, as configured
pub struct Host {
    pub packages: SystemPackages,
    pub files: HostFs,
}

impl Host {
    pub fn connect(config: &AgentConfig) -> Result<Self> {
        let client = match config.packages.manager {
            Some(kind) => Client::for_kind(kind)
                .with_context(|| format!("Configured package manager {kind} is not usable"))?,
            None => Client::detect().context("Could not detect the package manager")?,
        };
        log::info!("package manager: {}", client.kind());

        let root = config.files_root();
        let mut files = HostFs::new(&root);
        if root != std::path::Path::new("/") && !crate::privilege::is_root() {
            log::debug!("staging root {} without ownership changes", root.display());
            files = files.without_ownership();
        }

        Ok(Self {
            packages: SystemPackages::new(client, config.retry_config()),
            files,
        })
    }
}
