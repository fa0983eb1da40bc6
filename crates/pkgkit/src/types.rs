//! Core types for system package management.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported system package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManagerKind {
    /// dnf (Fedora, RHEL 8+)
    Dnf,
    /// yum (RHEL/CentOS 7)
    Yum,
    /// zypper (SLES, openSUSE)
    Zypper,
    /// apt (Debian, Ubuntu)
    Apt,
}

impl PackageManagerKind {
    /// All kinds, in detection order.
    pub const ALL: [Self; 4] = [Self::Dnf, Self::Yum, Self::Zypper, Self::Apt];

    /// Name used in configuration and output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Zypper => "zypper",
            Self::Apt => "apt",
        }
    }

    /// Executable that performs installs and removals.
    pub fn executable(&self) -> &'static str {
        match self {
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Zypper => "zypper",
            Self::Apt => "apt-get",
        }
    }

    /// Whether the package database is rpm-based.
    pub fn is_rpm(&self) -> bool {
        !matches!(self, Self::Apt)
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PackageManagerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dnf" => Ok(Self::Dnf),
            "yum" => Ok(Self::Yum),
            "zypper" => Ok(Self::Zypper),
            "apt" | "apt-get" => Ok(Self::Apt),
            other => Err(format!("unknown package manager: {other}")),
        }
    }
}

/// Information about an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Package name
    pub name: String,
    /// Installed version (version-release for rpm)
    pub version: String,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            ..Default::default()
        }
    }

    /// Set the maximum delay between retries.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    ///
    /// Never exceeds `max_delay`, however large the attempt or the factor.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = delay.min(self.max_delay.as_secs_f64()).max(0.0);
        Duration::try_from_secs_f64(capped).map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_with_huge_max_does_not_panic() {
        let config = RetryConfig::new(5, Duration::from_secs(10), 2.0)
            .with_max_delay(Duration::from_secs(u64::MAX));
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("dnf".parse::<PackageManagerKind>(), Ok(PackageManagerKind::Dnf));
        assert_eq!("APT".parse::<PackageManagerKind>(), Ok(PackageManagerKind::Apt));
        assert_eq!(
            "apt-get".parse::<PackageManagerKind>(),
            Ok(PackageManagerKind::Apt)
        );
        assert!("pacman".parse::<PackageManagerKind>().is_err());
    }

    #[test]
    fn test_kind_executable() {
        assert_eq!(PackageManagerKind::Apt.executable(), "apt-get");
        assert_eq!(PackageManagerKind::Zypper.to_string(), "zypper");
        assert!(PackageManagerKind::Yum.is_rpm());
        assert!(!PackageManagerKind::Apt.is_rpm());
    }

    #[test]
    fn test_delay_for_attempt() {
        let config = RetryConfig::new(5, Duration::from_secs(2), 2.0)
            .with_max_delay(Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(8));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(10));
    }

    #[test]
    fn test_no_retry() {
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }
}
