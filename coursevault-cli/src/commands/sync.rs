//! `coursevault sync`: one full run in the foreground.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use coursevault_core::SyncReport;
use coursevault_sync::run_configured;

use super::home;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let report = run_configured(&home).context("sync failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

pub(crate) fn print_report(report: &SyncReport) {
    if report.courses_synced.is_empty() && report.written == 0 && report.errors.is_empty() {
        println!("Nothing to sync. Select courses with `coursevault select`.");
        return;
    }

    let mark = if report.is_clean() {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!(
        "{mark} {} course(s) synced, {} written, {} skipped (local edits)",
        report.courses_synced.len(),
        report.written,
        report.skipped_conflicts
    );
    if !report.courses_synced.is_empty() {
        println!("  courses: {}", report.courses_synced.join(", "));
    }
    for (kind, n) in report.written_by_kind() {
        if n > 0 {
            println!("  {:<16} {n}", kind.folder_name());
        }
    }
    if report.todo_generated {
        println!("  task list updated");
    }
    for error in &report.errors {
        println!("  {} {error}", "✗".red());
    }
    if report.skipped_conflicts > 0 {
        println!("Run `coursevault status` to see edited artifacts.");
    }
}
