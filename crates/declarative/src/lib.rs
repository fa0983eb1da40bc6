//! # Declarative
//!
//! A framework for desired-state reconciliation.
//!
//! This crate provides the core abstractions for declaring desired state,
//! observing current state, and converging a host to the desired state
//! idempotently.
//!
//! ## Core Concepts
//!
//! - **Facts**: Immutable facts about the host, gathered once per run
//! - **DesiredResource**: A package or a file with convergence semantics
//! - **Catalog**: The ordered, duplicate-free set of resources for a host
//! - **Diff**: What has to happen to converge one resource
//! - **RunResult**: Per-resource outcomes of one reconciliation pass
//!
//! ## Example
//!
//! ```
//! use declarative::{
//!     ApplyContext, Catalog, ContentSpec, ExecuteOptions, FileResource, MemoryHost,
//!     PackageResource, execute_simple,
//! };
//!
//! let mut catalog = Catalog::new();
//! catalog.add(PackageResource::installed("ivanti-base-agent")).unwrap();
//! catalog
//!     .add(FileResource::present(
//!         "/etc/motd",
//!         ContentSpec::exact("managed\n"),
//!     ))
//!     .unwrap();
//!
//! let host = MemoryHost::new();
//! let ctx = ApplyContext::new(&host, &host);
//! let result = execute_simple(&catalog, &ctx, &ExecuteOptions::default());
//! assert!(result.is_success());
//!
//! // A converged host makes no further changes
//! let again = execute_simple(&catalog, &ctx, &ExecuteOptions::default());
//! assert_eq!(again.summary().unchanged, 2);
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`PackageManager`]: Query, install and remove packages
//! - [`FileSystem`]: Read, write and remove files
//! - [`FactProvider`]: Supplies host facts
//! - [`ProgressCallback`]: Receives progress updates
//!
//! This allows the crate to be used without hard dependencies on a
//! specific package manager, filesystem layout or UI.

pub mod catalog;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod memory;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use catalog::Catalog;
pub use context::{
    ApplyContext, FactProvider, FileSystem, NoProgress, PackageManager, ProgressCallback,
};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs, diff, group_by_type, observe};
pub use error::{Error, FsError, PackageError, QueryError, Result};
pub use executor::{DEADLINE_EXCEEDED, apply, execute, execute_simple, reconcile};
pub use memory::MemoryHost;
pub use resource::{ContentSpec, DesiredResource, FileAttributes, FileResource, PackageResource};
pub use types::{
    Change, Diff, Ensure, ExecuteOptions, ExecuteSummary, Facts, FileEnsure, FileState,
    InstallState, ObservedState, Outcome, ResourceOutcome, RunResult,
};
