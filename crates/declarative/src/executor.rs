//! Enforcement and the run loop
//!
//! Resources are reconciled one at a time in catalog order. The external
//! package manager already serializes installs behind its own lock, so
//! there is nothing to gain from running resources in parallel.

use crate::catalog::Catalog;
use crate::context::{ApplyContext, ProgressCallback};
use crate::diff::{diff, observe};
use crate::resource::{DesiredResource, FileResource, PackageResource};
use crate::types::{Change, Diff, ExecuteOptions, Outcome, ResourceOutcome, RunResult};
use std::time::Instant;

/// Reason recorded for resources left unprocessed when the deadline passes
pub const DEADLINE_EXCEEDED: &str = "run deadline exceeded";

/// Apply a diff to a single resource
///
/// `NoOp` issues no call at all. `Unknown` is a failure and nothing is
/// written: an inconclusive read never leads to a mutation.
pub fn apply(resource: &DesiredResource, diff: &Diff, ctx: &ApplyContext) -> Outcome {
    let change = match diff {
        Diff::NoOp => return Outcome::Unchanged,
        Diff::Unknown { reason } => {
            return Outcome::Failed {
                reason: reason.clone(),
            };
        }
        Diff::Create => Change::Created,
        Diff::Update => Change::Updated,
        Diff::Delete => Change::Removed,
    };

    if ctx.dry_run {
        return Outcome::Skipped {
            reason: format!("dry run: would {}", diff.verb()),
        };
    }

    let result = match resource {
        DesiredResource::Package(p) => apply_package(p, change, ctx),
        DesiredResource::File(f) => apply_file(f, change, ctx),
    };

    match result {
        Ok(()) => Outcome::Applied { change },
        Err(reason) => Outcome::Failed { reason },
    }
}

fn apply_package(
    resource: &PackageResource,
    change: Change,
    ctx: &ApplyContext,
) -> Result<(), String> {
    let result = match change {
        Change::Created | Change::Updated => ctx.packages.ensure_installed(&resource.name),
        Change::Removed => ctx.packages.ensure_absent(&resource.name),
    };
    result.map_err(|e| e.to_string())
}

fn apply_file(resource: &FileResource, change: Change, ctx: &ApplyContext) -> Result<(), String> {
    // Create and Update both rewrite the full content
    let result = match change {
        Change::Created | Change::Updated => ctx.files.write_file(
            resource.path(),
            resource.content.rendered().as_bytes(),
            &resource.attributes,
        ),
        Change::Removed => ctx.files.remove_file(resource.path()),
    };
    result.map_err(|e| e.to_string())
}

/// Reconcile a single resource: observe, diff, apply
pub fn reconcile(resource: &DesiredResource, ctx: &ApplyContext) -> ResourceOutcome {
    let observed = observe(resource, ctx);
    let diff = diff(resource, &observed);
    if ctx.verbose {
        log::info!("{}: {}", resource.id(), diff.verb());
    } else {
        log::debug!("{}: {:?}", resource.id(), diff);
    }

    let outcome = apply(resource, &diff, ctx);
    if let Outcome::Failed { reason } = &outcome {
        log::warn!("{} failed: {}", resource.id(), reason);
    }

    ResourceOutcome {
        resource_id: resource.id(),
        resource_type: resource.resource_type().to_string(),
        diff,
        outcome,
    }
}

/// Execute a catalog against the host
///
/// Every resource is processed independently: a failure is recorded and
/// the run moves on. The run always reaches the end of the catalog; when
/// `opts.deadline` passes, the remaining resources are recorded as failed
/// without touching the host.
///
/// The run is dry when either `ctx.dry_run` or `opts.dry_run` is set.
pub fn execute<P: ProgressCallback>(
    catalog: &Catalog,
    ctx: &ApplyContext,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> RunResult {
    let ctx = ApplyContext {
        packages: ctx.packages,
        files: ctx.files,
        dry_run: ctx.dry_run || opts.dry_run,
        verbose: ctx.verbose || opts.verbose,
    };
    let started = Instant::now();
    let mut result = RunResult::new();

    progress.on_run_start(catalog.len());

    for resource in catalog {
        let id = resource.id();
        progress.on_resource_start(&id, &resource.description());

        let expired = opts
            .deadline
            .is_some_and(|deadline| started.elapsed() >= deadline);

        let entry = if expired {
            ResourceOutcome {
                resource_id: id.clone(),
                resource_type: resource.resource_type().to_string(),
                diff: Diff::Unknown {
                    reason: DEADLINE_EXCEEDED.to_string(),
                },
                outcome: Outcome::Failed {
                    reason: DEADLINE_EXCEEDED.to_string(),
                },
            }
        } else {
            reconcile(resource, &ctx)
        };

        progress.on_resource_complete(&id, &entry.outcome);
        result.record(entry);
    }

    progress.on_run_complete(&result);
    result
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress reporting.
pub fn execute_simple(catalog: &Catalog, ctx: &ApplyContext, opts: &ExecuteOptions) -> RunResult {
    use crate::context::NoProgress;

    execute(catalog, ctx, opts, &mut NoProgress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use crate::resource::ContentSpec;
    use crate::types::{FileState, ObservedState};
    use std::time::Duration;

    const RULE: &str = r"^landesk[ \t]+ALL=\(ALL\)[ \t]+NOPASSWD:[ \t]+ALL$";
    const PATH: &str = "/etc/sudoers.d/10_landesk";

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for name in ["ivanti-base-agent", "ivanti-pds2", "ivanti-cba8"] {
            catalog.add(PackageResource::installed(name)).unwrap();
        }
        let spec =
            ContentSpec::pattern("file:test", "landesk ALL=(ALL)  NOPASSWD: ALL\n", RULE).unwrap();
        catalog
            .add(FileResource::present(PATH, spec).with_mode(0o440))
            .unwrap();
        catalog
    }

    fn run(host: &MemoryHost, opts: &ExecuteOptions) -> RunResult {
        let ctx = ApplyContext::new(host, host).dry_run(opts.dry_run);
        execute_simple(&catalog(), &ctx, opts)
    }

    #[test]
    fn test_execute_empty_catalog() {
        let host = MemoryHost::new();
        let ctx = ApplyContext::new(&host, &host);
        let result = execute_simple(&Catalog::new(), &ctx, &ExecuteOptions::default());
        assert!(result.is_empty());
        assert!(result.is_success());
    }

    #[test]
    fn test_clean_host_converges() {
        let host = MemoryHost::new();
        let result = run(&host, &ExecuteOptions::default());

        assert_eq!(result.len(), 4);
        assert!(result.outcomes.iter().all(|o| o.outcome.is_applied()));
        assert!(host.is_installed("ivanti-pds2"));
        assert_eq!(host.file_mode_of(PATH), Some(0o440));
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let host = MemoryHost::new();
        run(&host, &ExecuteOptions::default());
        let calls = host.mutating_calls();

        let second = run(&host, &ExecuteOptions::default());
        assert!(second.outcomes.iter().all(|o| o.outcome == Outcome::Unchanged));
        assert_eq!(host.mutating_calls(), calls);
    }

    #[test]
    fn test_failure_is_isolated() {
        let host = MemoryHost::new();
        host.fail_install("ivanti-pds2", "No match for argument: ivanti-pds2");

        let result = run(&host, &ExecuteOptions::default());
        assert_eq!(result.failed().count(), 1);
        assert_eq!(
            result.failed().next().map(|o| o.resource_id.as_str()),
            Some("package:ivanti-pds2")
        );
        assert!(result.get("package:ivanti-cba8").unwrap().is_applied());
        assert!(result.get(&format!("file:{PATH}")).unwrap().is_applied());
        assert!(!result.is_success());
        match result.get("package:ivanti-pds2").unwrap() {
            Outcome::Failed { reason } => assert!(reason.contains("No match for argument")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_unknown_never_mutates() {
        let host = MemoryHost::new();
        host.put_file(PATH, "garbage\n", 0o440);
        host.fail_read(PATH);
        let before = host.mutating_calls();

        let ctx = ApplyContext::new(&host, &host);
        let file = catalog().get(&format!("file:{PATH}")).unwrap().clone();
        let entry = reconcile(&file, &ctx);

        assert!(matches!(entry.diff, Diff::Unknown { .. }));
        assert!(entry.outcome.is_failed());
        assert_eq!(host.mutating_calls(), before);
        assert_eq!(host.content_of(PATH).as_deref(), Some("garbage\n"));
    }

    #[test]
    fn test_drift_is_corrected() {
        let host = MemoryHost::new();
        run(&host, &ExecuteOptions::default());

        host.put_file(PATH, "landesk ALL=(ALL) ALL\n", 0o440);
        host.remove_package("ivanti-cba8");

        let result = run(&host, &ExecuteOptions::default());
        assert_eq!(result.summary().updated, 1);
        assert_eq!(result.summary().created, 1);
        assert_eq!(result.summary().unchanged, 2);

        let third = run(&host, &ExecuteOptions::default());
        assert_eq!(third.summary().unchanged, 4);
    }

    #[test]
    fn test_dry_run_makes_no_calls() {
        let host = MemoryHost::new();
        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = run(&host, &opts);

        assert_eq!(result.summary().skipped, 4);
        assert!(result.is_success());
        assert_eq!(host.mutating_calls(), 0);
        assert!(!host.is_installed("ivanti-pds2"));
    }

    #[test]
    fn test_dry_run_option_alone_makes_no_calls() {
        let host = MemoryHost::new();
        let ctx = ApplyContext::new(&host, &host);
        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = execute_simple(&catalog(), &ctx, &opts);

        assert_eq!(result.summary().skipped, 4);
        assert_eq!(host.mutating_calls(), 0);
        assert!(!host.is_installed("ivanti-base-agent"));
    }

    #[test]
    fn test_deadline_aborts_remaining() {
        let host = MemoryHost::new();
        let opts = ExecuteOptions {
            deadline: Some(Duration::ZERO),
            ..Default::default()
        };
        let result = run(&host, &opts);

        assert_eq!(result.summary().failed, 4);
        assert_eq!(host.mutating_calls(), 0);
        assert_eq!(
            result.get("package:ivanti-base-agent"),
            Some(&Outcome::Failed {
                reason: DEADLINE_EXCEEDED.to_string()
            })
        );
    }

    #[test]
    fn test_delete_removes() {
        let host = MemoryHost::new();
        host.install("ivanti-legacy");
        let ctx = ApplyContext::new(&host, &host);
        let absent: DesiredResource = PackageResource::absent("ivanti-legacy").into();

        let entry = reconcile(&absent, &ctx);
        assert_eq!(entry.diff, Diff::Delete);
        assert_eq!(
            entry.outcome,
            Outcome::Applied {
                change: Change::Removed
            }
        );
        assert!(!host.is_installed("ivanti-legacy"));
    }

    #[test]
    fn test_write_failure_recorded() {
        let host = MemoryHost::new();
        host.fail_write(PATH, "read-only file system");
        let result = run(&host, &ExecuteOptions::default());

        assert_eq!(result.failed().count(), 1);
        assert_eq!(result.summary().created, 3);
        let ctx = ApplyContext::new(&host, &host);
        let file = catalog().get(&format!("file:{PATH}")).unwrap().clone();
        assert_eq!(
            observe(&file, &ctx),
            ObservedState::File(FileState::Missing)
        );
    }

    #[test]
    fn test_progress_callbacks() {
        #[derive(Default)]
        struct Recorder {
            started: usize,
            completed: Vec<String>,
            finished: bool,
        }

        impl ProgressCallback for Recorder {
            fn on_run_start(&mut self, count: usize) {
                self.started = count;
            }
            fn on_resource_start(&mut self, _id: &str, _description: &str) {}
            fn on_resource_complete(&mut self, id: &str, _outcome: &Outcome) {
                self.completed.push(id.to_string());
            }
            fn on_run_complete(&mut self, _result: &RunResult) {
                self.finished = true;
            }
        }

        let host = MemoryHost::new();
        let ctx = ApplyContext::new(&host, &host);
        let mut recorder = Recorder::default();
        execute(&catalog(), &ctx, &ExecuteOptions::default(), &mut recorder);

        assert_eq!(recorder.started, 4);
        assert_eq!(recorder.completed[0], "package:ivanti-base-agent");
        assert_eq!(recorder.completed.len(), 4);
        assert!(recorder.finished);
    }
}
