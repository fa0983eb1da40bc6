//! Declarative commands
//!
//! - `diff` - Preview what apply would change
//! - `apply` - Make current state match desired state

use anyhow::{Result, bail};
use chrono::Utc;
use std::time::Duration;
use declarative::{ApplyContext, Catalog, DiffSummary, Outcome, compute_diffs};

use super::{compile, gather_facts};
use crate::cli::ApplyArgs;
use crate::engine::differ::{display_content_diffs, display_diff};
use crate::engine::{self, RunOptions, RunReport, RunStatus};
use crate::host::Host;
use crate::{Context, privilege, ui};

fn select(catalog: Catalog, target: Option<&str>) -> Result<Catalog> {
    let selected = catalog.filter_by_target(target);
    if selected.is_empty()
        && let Some(target) = target
    {
        bail!("No resources match target '{target}'");
    }
    Ok(selected)
}

pub fn diff(ctx: &Context, target: Option<&str>) -> Result<()> {
    let facts = gather_facts(ctx)?;
    let catalog = select(compile(&facts, &ctx.config.catalog_options())?, target)?;
    let host = Host::connect(&ctx.config)?;
    let apply_ctx = ApplyContext::new(&host.packages, &host.files).dry_run(true);

    if !ctx.quiet {
        ui::header(&format!("Configuration Diff ({facts})"));
    }

    let diffs = compute_diffs(&catalog, &apply_ctx);
    display_diff(&diffs, &catalog);
    display_content_diffs(&diffs);

    let summary = DiffSummary::from_diffs(&diffs);
    if summary.unknown > 0 {
        bail!("{} resources could not be inspected", summary.unknown);
    }
    if !ctx.quiet {
        println!();
        if summary.has_changes() {
            ui::info(&format!(
                "{} changes pending, run `ivanti-agent apply` to converge",
                summary.total()
            ));
        } else {
            ui::success("Host matches the agent baseline");
        }
    }
    Ok(())
}

pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let started_at = Utc::now();
    let facts = gather_facts(ctx)?;
    let catalog = select(
        compile(&facts, &ctx.config.catalog_options())?,
        args.target.as_deref(),
    )?;

    privilege::require_root(args.dry_run, &ctx.config.files_root())?;
    let host = Host::connect(&ctx.config)?;

    let verbose = ctx.verbose > 0;
    let apply_ctx = ApplyContext::new(&host.packages, &host.files)
        .dry_run(args.dry_run)
        .verbose(verbose);

    let opts = RunOptions {
        dry_run: args.dry_run,
        yes: args.yes,
        verbose,
        json: args.json,
        timeout: args
            .timeout
            .map(Duration::from_secs)
            .or_else(|| ctx.config.timeout()),
    };

    if !opts.json {
        ui::header(&format!("Applying Configuration ({facts})"));
    }

    let result = match engine::execute(&catalog, &apply_ctx, &opts)? {
        RunStatus::Completed(result) => result,
        RunStatus::Aborted => return Ok(()),
    };

    if args.json {
        let report = RunReport::new(&facts, args.dry_run, started_at, &result);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !result.is_success() {
        for failed in result.failed() {
            if let Outcome::Failed { reason } = &failed.outcome {
                ui::error(&format!("{}: {reason}", failed.resource_id));
            }
        }
        bail!(
            "{} of {} resources failed",
            result.summary().failed,
            result.len()
        );
    }
    Ok(())
}
