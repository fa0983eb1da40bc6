//! Observation and diff computation for resources

use crate::catalog::Catalog;
use crate::context::ApplyContext;
use crate::error::QueryError;
use crate::resource::{DesiredResource, FileResource, PackageResource};
use crate::types::{Diff, Ensure, FileEnsure, FileState, InstallState, ObservedState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query the host for the current state of a resource
///
/// Never fails: a failed query becomes [`ObservedState::Unknown`] so the
/// comparator can report it instead of guessing.
pub fn observe(resource: &DesiredResource, ctx: &ApplyContext) -> ObservedState {
    let observed = match resource {
        DesiredResource::Package(p) => ctx
            .packages
            .query_installed(&p.name)
            .map(ObservedState::Package),
        DesiredResource::File(f) => observe_file(f, ctx).map(ObservedState::File),
    };

    match observed {
        Ok(state) => state,
        Err(e) => {
            log::debug!("Could not observe {}: {}", resource.id(), e);
            ObservedState::Unknown {
                reason: e.to_string(),
            }
        }
    }
}

fn observe_file(resource: &FileResource, ctx: &ApplyContext) -> Result<FileState, QueryError> {
    let path = resource.path();
    let bytes = match ctx.files.read_file(path) {
        Ok(bytes) => bytes,
        Err(e) if e.is_not_found() => return Ok(FileState::Missing),
        Err(source) => {
            return Err(QueryError::File {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mode = ctx
        .files
        .file_mode(path)
        .map_err(|source| QueryError::File {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(FileState::Present {
        content: String::from_utf8_lossy(&bytes).into_owned(),
        mode,
    })
}

/// Compare a desired resource against its observed state
pub fn diff(desired: &DesiredResource, observed: &ObservedState) -> Diff {
    match (desired, observed) {
        (_, ObservedState::Unknown { reason }) => Diff::Unknown {
            reason: reason.clone(),
        },
        (DesiredResource::Package(p), ObservedState::Package(state)) => diff_package(p, state),
        (DesiredResource::File(f), ObservedState::File(state)) => diff_file(f, state),
        _ => Diff::Unknown {
            reason: format!(
                "observed state does not describe a {}",
                desired.resource_type()
            ),
        },
    }
}

fn diff_package(desired: &PackageResource, state: &InstallState) -> Diff {
    match (desired.ensure, state.is_installed()) {
        (Ensure::Installed, true) | (Ensure::Absent, false) => Diff::NoOp,
        (Ensure::Installed, false) => Diff::Create,
        (Ensure::Absent, true) => Diff::Delete,
    }
}

fn diff_file(desired: &FileResource, state: &FileState) -> Diff {
    match (desired.ensure, state) {
        (FileEnsure::Absent, FileState::Missing) => Diff::NoOp,
        (FileEnsure::Absent, FileState::Present { .. }) => Diff::Delete,
        (FileEnsure::Present, FileState::Missing) => Diff::Create,
        (FileEnsure::Present, FileState::Present { content, mode }) => {
            if !desired.content.is_satisfied_by(content) {
                return Diff::Update;
            }
            match (desired.attributes.mode, mode) {
                (Some(want), Some(have)) if want != (have & 0o7777) => Diff::Update,
                _ => Diff::NoOp,
            }
        }
    }
}

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Unique identifier of the resource
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Human-readable description
    pub description: String,
    /// What was observed on the host
    pub observed: ObservedState,
    /// What has to happen
    pub diff: Diff,
    /// Content that would be written, for file creates and updates
    pub desired_content: Option<String>,
}

impl ResourceDiff {
    /// Observe a resource and diff it, returning None if no changes needed
    pub fn from_resource(resource: &DesiredResource, ctx: &ApplyContext) -> Option<Self> {
        let observed = observe(resource, ctx);
        let diff = diff(resource, &observed);

        if diff == Diff::NoOp {
            return None;
        }

        let desired_content = match (resource, &diff) {
            (DesiredResource::File(f), Diff::Create | Diff::Update) => {
                Some(f.content.rendered().to_string())
            }
            _ => None,
        };

        Some(Self {
            resource_id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            observed,
            diff,
            desired_content,
        })
    }

    /// Content currently on the host, for file diffs
    pub fn current_content(&self) -> Option<&str> {
        match &self.observed {
            ObservedState::File(FileState::Present { content, .. }) => Some(content),
            _ => None,
        }
    }
}

/// Compute diffs for every resource in the catalog
///
/// Returns only resources that have differences between current and desired state.
pub fn compute_diffs(catalog: &Catalog, ctx: &ApplyContext) -> Vec<ResourceDiff> {
    catalog
        .iter()
        .filter_map(|r| ResourceDiff::from_resource(r, ctx))
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    /// Resources whose state could not be determined
    pub unknown: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for d in diffs {
            match d.diff {
                Diff::NoOp => {}
                Diff::Create => summary.creates += 1,
                Diff::Update => summary.updates += 1,
                Diff::Delete => summary.deletes += 1,
                Diff::Unknown { .. } => summary.unknown += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type
pub fn group_by_type(diffs: &[ResourceDiff]) -> HashMap<String, Vec<&ResourceDiff>> {
    let mut groups: HashMap<String, Vec<&ResourceDiff>> = HashMap::new();
    for d in diffs {
        groups.entry(d.resource_type.clone()).or_default().push(d);
    }
    groups
}
