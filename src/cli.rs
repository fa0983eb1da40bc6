use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ivanti-agent")]
#[command(version)]
#[command(about = "Converge this host to the Ivanti agent baseline", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to $IVANTI_AGENT_CONFIG or /etc/ivanti-agent/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub facts: FactsArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for detected host facts
#[derive(Args, Clone, Default)]
pub struct FactsArgs {
    /// Operating system family (e.g. RedHat, Suse, Debian)
    #[arg(long, global = true, value_name = "FAMILY")]
    pub os_family: Option<String>,

    /// Operating system version (e.g. 8)
    #[arg(long, global = true, value_name = "VERSION")]
    pub os_version: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the facts this host is detected as
    Facts,

    /// Show the resources compiled for this host
    Catalog(CatalogArgs),

    /// Preview what apply would change
    Diff(DiffArgs),

    /// Converge the host
    Apply(ApplyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct CatalogArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Only consider matching resources (package, file, package.ivanti-pds2, ...)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only apply matching resources (package, file, package.ivanti-pds2, ...)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Dry run - show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Give up on resources not started within this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
