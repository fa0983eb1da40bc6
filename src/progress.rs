//! Progress reporting for reconciliation runs

use crate::ui;
use colored::Colorize;
use declarative::{Outcome, ProgressCallback, RunResult};
use indicatif::{ProgressBar, ProgressStyle};

/// Status glyph for an outcome
pub fn symbol(outcome: &Outcome) -> colored::ColoredString {
    match outcome {
        Outcome::Unchanged => "○".dimmed(),
        Outcome::Applied { .. } => "✓".green(),
        Outcome::Failed { .. } => "✗".red(),
        Outcome::Skipped { .. } => "⊘".yellow(),
    }
}

/// Progress bar that prints one line per resource as it completes
pub struct BarProgress {
    bar: ProgressBar,
    enabled: bool,
    verbose: bool,
}

impl BarProgress {
    pub fn new(verbose: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            enabled: true,
            verbose,
        }
    }

    /// Nothing is drawn, for `--json`
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            enabled: false,
            verbose: false,
        }
    }
}

impl ProgressCallback for BarProgress {
    fn on_run_start(&mut self, count: usize) {
        if !self.enabled {
            return;
        }
        self.bar = ProgressBar::new(count as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            self.bar.set_style(style.progress_chars("=>-"));
        }
    }

    fn on_resource_start(&mut self, id: &str, _description: &str) {
        self.bar.set_message(ui::truncate(id, 40));
    }

    fn on_resource_complete(&mut self, id: &str, outcome: &Outcome) {
        let detail = match outcome {
            Outcome::Unchanged if !self.verbose => None,
            Outcome::Unchanged => Some("unchanged".dimmed().to_string()),
            Outcome::Applied { change } => Some(format!("{change:?}").to_lowercase()),
            Outcome::Failed { reason } => Some(reason.red().to_string()),
            Outcome::Skipped { reason } => Some(reason.dimmed().to_string()),
        };
        if self.enabled
            && let Some(detail) = detail
        {
            self.bar
                .println(format!("  {} {:<40} {}", symbol(outcome), id, detail));
        }
        self.bar.inc(1);
    }

    fn on_run_complete(&mut self, _result: &RunResult) {
        self.bar.finish_and_clear();
    }
}
