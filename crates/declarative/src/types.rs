//! Core types for declarative reconciliation

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Immutable facts about the target host, gathered once per run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facts {
    /// Operating system family (e.g., "RedHat", "Debian")
    pub os_family: String,
    /// Operating system version (e.g., "8", "22.04")
    pub os_version: String,
}

impl Facts {
    /// Create a new set of facts
    pub fn new(os_family: impl Into<String>, os_version: impl Into<String>) -> Self {
        Self {
            os_family: os_family.into(),
            os_version: os_version.into(),
        }
    }

    /// Ensure both facts carry a value
    pub fn validate(&self) -> Result<()> {
        if self.os_family.trim().is_empty() {
            return Err(Error::InvalidFacts {
                reason: "os_family is empty".to_string(),
            });
        }
        if self.os_version.trim().is_empty() {
            return Err(Error::InvalidFacts {
                reason: "os_version is empty".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Facts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.os_family, self.os_version)
    }
}

/// Desired presence of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    Installed,
    Absent,
}

/// Desired presence of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEnsure {
    Present,
    Absent,
}

/// Install status reported by the package manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallState {
    /// Installed, with the version when the manager reports one
    Installed { version: Option<String> },
    NotInstalled,
}

impl InstallState {
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

/// Observed state of a file on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    Missing,
    /// File exists; `mode` holds the permission bits when known
    Present { content: String, mode: Option<u32> },
}

/// Host-queried counterpart of a desired resource
///
/// Always fetched fresh; never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedState {
    Package(InstallState),
    File(FileState),
    /// The query itself failed
    Unknown { reason: String },
}

/// What has to happen to converge one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diff {
    /// Already converged
    NoOp,
    /// Resource is missing
    Create,
    /// Resource exists but differs
    Update,
    /// Resource exists but must not
    Delete,
    /// Observed state could not be determined
    Unknown { reason: String },
}

impl Diff {
    /// Whether enforcement has to act on this diff
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }

    /// Short verb used in reports
    pub fn verb(&self) -> &'static str {
        match self {
            Self::NoOp => "keep",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Unknown { .. } => "inspect",
        }
    }
}

/// Kind of change an enforcement made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Created,
    Updated,
    Removed,
}

/// Final outcome for one resource in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// No changes needed, no call issued
    Unchanged,
    /// The resource was converged
    Applied { change: Change },
    /// Convergence failed; the reason is kept for the caller
    Failed { reason: String },
    /// Dry run: the change was computed but not made
    Skipped { reason: String },
}

impl Outcome {
    /// Check if the outcome represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the outcome changed the host
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome recorded against a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOutcome {
    pub resource_id: String,
    pub resource_type: String,
    pub diff: Diff,
    pub outcome: Outcome,
}

/// Ordered outcomes of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub outcomes: Vec<ResourceOutcome>,
}

impl RunResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one resource
    pub fn record(&mut self, outcome: ResourceOutcome) {
        self.outcomes.push(outcome);
    }

    /// Look up the outcome of a resource by id
    pub fn get(&self, resource_id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.resource_id == resource_id)
            .map(|o| &o.outcome)
    }

    /// Resources that failed
    pub fn failed(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.is_failed())
    }

    /// True when no resource failed
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.outcome.is_success())
    }

    /// Number of recorded resources
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Aggregate counters
    pub fn summary(&self) -> ExecuteSummary {
        let mut summary = ExecuteSummary::default();
        for entry in &self.outcomes {
            summary.add_outcome(&entry.outcome);
        }
        summary
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.unchanged + self.failed + self.skipped
    }

    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Applied { change } => match change {
                Change::Created => self.created += 1,
                Change::Updated => self.updated += 1,
                Change::Removed => self.removed += 1,
            },
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Compute and report diffs without changing the host
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
    /// Wall-clock budget for the whole run
    pub deadline: Option<Duration>,
}
