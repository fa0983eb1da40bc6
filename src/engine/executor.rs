//! Run execution with UI integration

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use declarative::{
    ApplyContext, Catalog, ExecuteOptions, ExecuteSummary, Facts, ResourceOutcome, RunResult,
    compute_diffs,
};
use serde::Serialize;
use std::io::IsTerminal;
use std::time::Duration;

use super::differ::{display_content_diffs, display_diff};
use crate::progress::BarProgress;

/// Options for a run (CLI-level, includes `yes` for confirmation skip)
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
    /// Machine-readable output only
    pub json: bool,
    /// Budget for the whole run
    pub timeout: Option<Duration>,
}

/// Serialized result of one run, for `--json`
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub facts: Facts,
    pub dry_run: bool,
    pub success: bool,
    pub summary: ExecuteSummary,
    pub outcomes: Vec<ResourceOutcome>,
}

impl RunReport {
    pub fn new(
        facts: &Facts,
        dry_run: bool,
        started_at: DateTime<Utc>,
        result: &RunResult,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            facts: facts.clone(),
            dry_run,
            success: result.is_success(),
            summary: result.summary(),
            outcomes: result.outcomes.clone(),
        }
    }
}

/// How a run ended
pub enum RunStatus {
    Completed(RunResult),
    /// The operator declined the confirmation prompt
    Aborted,
}

/// Preview, confirm and execute a catalog
pub fn execute(catalog: &Catalog, ctx: &ApplyContext, opts: &RunOptions) -> Result<RunStatus> {
    if !opts.json {
        let diffs = compute_diffs(catalog, ctx);
        display_diff(&diffs, catalog);
        if opts.verbose {
            display_content_diffs(&diffs);
        }

        let has_changes = diffs.iter().any(|d| d.diff.is_change());
        let interactive = std::io::stdin().is_terminal();
        if has_changes && !opts.dry_run && !opts.yes && interactive && !confirm_proceed()? {
            println!();
            println!("  {} Aborted", "✗".red());
            return Ok(RunStatus::Aborted);
        }
        if opts.dry_run {
            println!();
            println!("  {} Dry run - no changes will be made", "ℹ".blue());
        }
        println!();
    }

    let exec_opts = ExecuteOptions {
        dry_run: opts.dry_run,
        verbose: opts.verbose,
        deadline: opts.timeout,
    };
    let mut progress = if opts.json {
        BarProgress::hidden()
    } else {
        BarProgress::new(opts.verbose)
    };
    let result = declarative::execute(catalog, ctx, &exec_opts, &mut progress);

    if !opts.json {
        print_summary(&result.summary(), opts.dry_run);
    }
    Ok(RunStatus::Completed(result))
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if !summary.is_success() {
        println!(
            "  {} Configuration applied with errors",
            "⚠".yellow().bold()
        );
    } else if dry_run {
        println!("  {} Dry run complete", "✓".green().bold());
    } else {
        println!(
            "  {} Configuration applied successfully!",
            "✓".green().bold()
        );
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources updated", summary.updated);
    }
    if summary.removed > 0 {
        println!("    • {} resources removed", summary.removed);
    }
    if summary.unchanged > 0 {
        println!("    • {} resources unchanged", summary.unchanged);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
