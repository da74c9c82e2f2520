//! `coursevault status`: artifact state and the last run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use coursevault_core::SyncReport;
use coursevault_sync::scan::format_age;
use coursevault_sync::{load_last_report, scan, ArtifactState, VaultScan};

use super::{home, load_settings};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// List current artifacts too, not only edited and missing ones.
    #[arg(long)]
    pub all: bool,
}

#[derive(Serialize)]
struct StatusJson {
    vault: String,
    summary: SummaryJson,
    artifacts: Vec<ArtifactJson>,
    last_report: Option<SyncReport>,
}

#[derive(Serialize)]
struct SummaryJson {
    never_synced: bool,
    last_saved: Option<DateTime<Utc>>,
    current: usize,
    modified: usize,
    missing: usize,
}

#[derive(Serialize)]
struct ArtifactJson {
    kind: String,
    remote_id: String,
    path: String,
    state: ArtifactState,
    synced_at: DateTime<Utc>,
}

#[derive(Tabled)]
struct ArtifactRow {
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "synced")]
    synced: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let settings = load_settings(&home)?;
        let vault = settings.vault_path_or_default(&home);

        let vault_scan = scan(&vault).context("failed to read sync state")?;
        let last_report = load_last_report(&vault).context("failed to read last report")?;

        if self.json {
            let payload = StatusJson {
                vault: vault.display().to_string(),
                summary: SummaryJson {
                    never_synced: vault_scan.never_synced,
                    last_saved: vault_scan.last_saved,
                    current: vault_scan.count(ArtifactState::Current),
                    modified: vault_scan.count(ArtifactState::Modified),
                    missing: vault_scan.count(ArtifactState::Missing),
                },
                artifacts: vault_scan
                    .artifacts
                    .iter()
                    .map(|a| ArtifactJson {
                        kind: a.kind.to_string(),
                        remote_id: a.remote_id.to_string(),
                        path: a.artifact_path.clone(),
                        state: a.state,
                        synced_at: a.synced_at,
                    })
                    .collect(),
                last_report,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&vault_scan, last_report.as_ref(), self.all);
        Ok(())
    }
}

fn print_table(vault_scan: &VaultScan, last_report: Option<&SyncReport>, all: bool) {
    let now = Utc::now();
    if vault_scan.never_synced {
        println!("Never synced. Run `coursevault sync`.");
        return;
    }

    println!(
        "{} {} current  {} {} modified  {} {} missing",
        "■".green().bold(),
        vault_scan.count(ArtifactState::Current),
        "■".red().bold(),
        vault_scan.count(ArtifactState::Modified),
        "■".yellow().bold(),
        vault_scan.count(ArtifactState::Missing),
    );
    if let Some(report) = last_report {
        let when = report
            .completed_at
            .map(|t| format_age(t, now))
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "Last sync {when} ago: {} written, {} skipped, {} error(s)",
            report.written,
            report.skipped_conflicts,
            report.errors.len()
        );
        for error in &report.errors {
            println!("  {} {error}", "✗".red());
        }
    }

    let rows: Vec<ArtifactRow> = vault_scan
        .artifacts
        .iter()
        .filter(|a| all || a.state != ArtifactState::Current)
        .map(|a| ArtifactRow {
            state: state_label(a.state),
            kind: a.kind.to_string(),
            id: a.remote_id.to_string(),
            path: a.artifact_path.clone(),
            synced: format!("{} ago", format_age(a.synced_at, now)),
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if vault_scan.count(ArtifactState::Modified) > 0 {
        println!(
            "Edited artifacts are never overwritten. `coursevault diff <kind> <id>` shows the \
             remote changes; `coursevault forget <kind> <id>` lets the next sync replace the file."
        );
    }
}

fn state_label(state: ArtifactState) -> String {
    match state {
        ArtifactState::Current => "CURRENT".green().to_string(),
        ArtifactState::Modified => "MODIFIED".red().to_string(),
        ArtifactState::Missing => "MISSING".yellow().to_string(),
    }
}
