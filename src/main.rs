mod catalog;
mod cli;
mod commands;
mod config;
mod engine;
mod facts;
mod host;
mod paths;
mod privilege;
mod progress;
mod runner;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, FactsArgs};
use config::AgentConfig;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: AgentConfig,
    pub facts: FactsArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "ivanti-agent", &mut io::stdout());
        return Ok(());
    }

    let config = AgentConfig::load(cli.config.as_deref())?;
    log::debug!("Loaded configuration: {config:?}");

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
        facts: cli.facts,
    };

    match cli.command {
        Command::Facts => commands::inspect::facts(&ctx),
        Command::Catalog(args) => commands::inspect::catalog(&ctx, args.json),
        Command::Diff(args) => commands::declarative::diff(&ctx, args.target.as_deref()),
        Command::Apply(args) => commands::declarative::apply(&ctx, &args),
        Command::Completions { .. } => Ok(()),
    }
}
