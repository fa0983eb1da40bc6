//! Package manager failures, classified from dnf/yum/zypper/apt-get output.
//!
//! The category decides whether a failure is retried and what the operator
//! is told to do about it.

use thiserror::Error;

/// Broad failure classes shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable)
    Network,
    /// Package not found in any enabled repository
    NotFound,
    /// Package database held by another process (transient, retryable)
    Locked,
    /// Version or dependency conflict
    Conflict,
    /// Permission denied (usually not running as root)
    Permission,
    /// No supported package manager on this host
    ManagerNotFound,
    /// Anything not recognized
    Other,
}

impl ErrorCategory {
    /// Transient classes that are retried with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Locked)
    }

    /// Short label used in log lines.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Package not found",
            Self::Locked => "Package database locked",
            Self::Conflict => "Package conflict",
            Self::Permission => "Permission denied",
            Self::ManagerNotFound => "No package manager",
            Self::Other => "Unexpected error",
        }
    }

    /// Operator-facing remedy.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check repository connectivity and try again",
            Self::NotFound => "Verify the package name and that the Ivanti repository is enabled",
            Self::Locked => "Wait for the other package operation to finish",
            Self::Conflict => "Resolve the conflict by removing conflicting packages",
            Self::Permission => "Run as root",
            Self::ManagerNotFound => "Install dnf, yum, zypper or apt, or set packages.manager",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// A failed package manager call.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (mirror unreachable, timeout, DNS, etc.)
    #[error("network error: {message}")]
    Network {
        /// Mirror or resolver output
        message: String,
    },

    /// Package not found in any enabled repository
    #[error("package not found: {name}")]
    NotFound {
        /// Requested package
        name: String,
    },

    /// Another process holds the package database lock
    #[error("package database locked: {message}")]
    Locked {
        /// Lock holder details from the package manager
        message: String,
    },

    /// Version or dependency conflict
    #[error("conflict: {message}")]
    Conflict {
        /// Solver output
        message: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// Manager output
        message: String,
    },

    /// No supported package manager was found in PATH
    #[error("no supported package manager found (tried dnf, yum, zypper, apt-get)")]
    ManagerNotFound,

    /// The manager exited non-zero for an unrecognized reason
    #[error("{message}: {stderr}")]
    CommandFailed {
        /// Which invocation failed
        message: String,
        /// Captured diagnostics
        stderr: String,
    },

    /// Free-form failure
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Locked { .. } => ErrorCategory::Locked,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::ManagerNotFound => ErrorCategory::ManagerNotFound,
            _ => ErrorCategory::Other,
        }
    }

    /// Shorthand for `self.category().is_retryable()`.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Classify the diagnostics of a failed dnf, yum, zypper or apt-get call.
    pub fn from_output(stderr: &str, package_name: Option<&str>) -> Self {
        let lower = stderr.to_lowercase();

        // apt's lock message says "temporarily unavailable"; match locks first
        if lower.contains("could not get lock")
            || lower.contains("unable to acquire the dpkg frontend lock")
            || lower.contains("waiting for process with pid")
            || lower.contains("another app is currently holding the yum lock")
            || lower.contains("system management is locked")
        {
            return Error::Locked {
                message: stderr.trim().to_string(),
            };
        }

        // Unreachable mirrors
        if lower.contains("could not resolve")
            || lower.contains("failed to download metadata")
            || lower.contains("cannot download repomd.xml")
            || lower.contains("curl error")
            || lower.contains("connection refused")
            || lower.contains("timed out")
            || lower.contains("temporary failure resolving")
            || lower.contains("failed to fetch")
            || lower.contains("download (curl) error")
        {
            return Error::Network {
                message: stderr.trim().to_string(),
            };
        }

        // Missing from every enabled repository
        if lower.contains("no match for argument")
            || (lower.contains("no package ") && lower.contains(" available"))
            || lower.contains("unable to locate package")
            || lower.contains("has no installation candidate")
            || lower.contains("no provider of")
            || lower.contains("not found in package names")
            || lower.contains("unable to find a match")
        {
            return Error::NotFound {
                name: package_name.unwrap_or("unknown").to_string(),
            };
        }

        // Not root
        if lower.contains("permission denied")
            || lower.contains("are you root")
            || lower.contains("this command has to be run with superuser privileges")
            || lower.contains("root privileges are required")
        {
            return Error::Permission {
                message: stderr.trim().to_string(),
            };
        }

        // Conflicts
        if lower.contains("conflicts with")
            || lower.contains("unmet dependencies")
            || lower.contains("nothing provides")
            || lower.contains("problem: ")
        {
            return Error::Conflict {
                message: stderr.trim().to_string(),
            };
        }

        // Default to command failed
        Error::CommandFailed {
            message: format!(
                "package manager failed{}",
                package_name
                    .map(|n| format!(" for {n}"))
                    .unwrap_or_default()
            ),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for package manager operations.
pub type Result<T> = std::result::Result<T, Error>;
