//! Sync orchestrator: one full run over the selected courses.
//!
//! The canonical entrypoint for both `coursevault sync` and the daemon.
//!
//! Order of units, each isolated and labeled in the report:
//!
//! 1. per course: assignments, module pages and links, files (if enabled)
//! 2. calendar events for every course, in one query
//! 3. the task list (if enabled)
//!
//! The state store is saved after every unit. Failure to save it, to take
//! the vault lock, or to build the renderer aborts the run.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use coursevault_canvas::{CanvasClient, HttpScraper, LmsClient, TaskScraper};
use coursevault_core::{
    credentials, settings, Course, CourseId, ItemKind, RemoteItem, Settings, SyncReport,
};
use coursevault_renderer::Renderer;

use crate::error::{io_err, SyncError};
use crate::lock::VaultLock;
use crate::paths::{state_dir, template_dir};
use crate::sources;
use crate::state_store::SyncStateStore;
use crate::synchronizer::{sync_items, sync_kind, KindOutcome, SyncContext};
use crate::tasks::{self, TaskEntry};

pub fn report_path(vault: &Path) -> PathBuf {
    state_dir(vault).join("last_report.json")
}

/// Report of the most recent completed run, if any.
pub fn load_last_report(vault: &Path) -> Result<Option<SyncReport>, SyncError> {
    let path = report_path(vault);
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(&path, err)),
    }
}

fn save_report(vault: &Path, report: &SyncReport) -> Result<(), SyncError> {
    let path = report_path(vault);
    let json = serde_json::to_string_pretty(report)?;
    crate::writer::atomic_write(&path, json.as_bytes())
}

fn tally(report: &mut SyncReport, kind: ItemKind, outcome: KindOutcome) {
    report.add_written(kind, outcome.written);
    report.skipped_conflicts += outcome.skipped_conflicts;
}

/// Run one full sync of `vault` against `client`.
///
/// With no selected courses nothing is attempted and the empty report is
/// returned without being persisted.
pub fn run_sync(
    vault: &Path,
    settings: &Settings,
    client: &dyn LmsClient,
    scraper: &dyn TaskScraper,
    now: DateTime<Utc>,
) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport {
        started_at: Some(now),
        ..SyncReport::default()
    };
    if settings.selected_courses.is_empty() {
        tracing::info!("no courses selected; nothing to sync");
        report.completed_at = Some(Utc::now());
        return Ok(report);
    }

    let _lock = VaultLock::acquire(vault)?;
    let renderer = Renderer::with_template_dir(&template_dir(vault))?;
    let mut store = SyncStateStore::load(vault)?;
    let ctx = SyncContext {
        vault,
        renderer: &renderer,
        client,
        now,
    };
    tracing::info!(
        "sync started for {} course(s) into {}",
        settings.selected_courses.len(),
        vault.display()
    );

    let mut courses: Vec<Course> = Vec::new();
    // Courses with a failed per-course unit; not counted as synced.
    let mut failed_courses: Vec<CourseId> = Vec::new();
    let mut task_entries: Vec<TaskEntry> = Vec::new();

    for selected in &settings.selected_courses {
        let course = match client.get_course(&selected.course_id) {
            Ok(course) => course,
            Err(err) => {
                tracing::warn!("course {} unavailable: {err}", selected.course_name);
                report
                    .errors
                    .push(format!("Course {}: {err}", selected.course_name));
                continue;
            }
        };
        let name = course.display_name();
        let mut course_ok = true;

        match sources::fetch_assignments(client, &course.id) {
            Ok(items) => {
                for item in &items {
                    if let RemoteItem::Assignment(a) = item {
                        task_entries.extend(TaskEntry::from_assignment(a, &name));
                    }
                }
                tally(
                    &mut report,
                    ItemKind::Assignment,
                    sync_items(&ctx, &mut store, &course, &items),
                );
            }
            Err(err) => {
                course_ok = false;
                report.errors.push(format!("Assignments for {name}: {err}"));
            }
        }
        store.save()?;

        match sources::fetch_module_content(client, &course.id) {
            Ok(content) => {
                tally(
                    &mut report,
                    ItemKind::Page,
                    sync_items(&ctx, &mut store, &course, &content.pages),
                );
                tally(
                    &mut report,
                    ItemKind::ExternalLink,
                    sync_items(&ctx, &mut store, &course, &content.links),
                );
            }
            Err(err) => {
                course_ok = false;
                report.errors.push(format!("Pages for {name}: {err}"));
            }
        }
        store.save()?;

        if settings.sync_files {
            match sync_kind(&ctx, &mut store, &course, ItemKind::File) {
                Ok((written, skipped)) => {
                    report.add_written(ItemKind::File, written);
                    report.skipped_conflicts += skipped;
                }
                Err(err) => {
                    course_ok = false;
                    report.errors.push(format!("Files for {name}: {err}"));
                }
            }
            store.save()?;
        }

        if !course_ok {
            failed_courses.push(course.id.clone());
        }
        courses.push(course);
    }

    let course_ids: Vec<CourseId> = courses.iter().map(|c| c.id.clone()).collect();
    match sources::fetch_events(client, &course_ids, now.date_naive()) {
        Ok(events) => {
            let mut by_course: HashMap<CourseId, Vec<RemoteItem>> = HashMap::new();
            for event in events {
                match event.course_id() {
                    Some(id) => by_course.entry(id).or_default().push(event),
                    None => tracing::debug!("ignoring non-course event {}", event.id()),
                }
            }
            for course in &courses {
                if let Some(items) = by_course.get(&course.id) {
                    tally(
                        &mut report,
                        ItemKind::CalendarEvent,
                        sync_items(&ctx, &mut store, course, items),
                    );
                }
            }
        }
        Err(err) => report.errors.push(format!("Calendar events: {err}")),
    }
    store.save()?;

    report.courses_synced = courses
        .iter()
        .filter(|c| !failed_courses.contains(&c.id))
        .map(Course::display_name)
        .collect();

    if settings.generate_todo {
        let scraped = tasks::collect_scraped(scraper, &settings.scrape_sources, &mut report.errors);
        let entries = tasks::merge_tasks(task_entries, scraped);
        match tasks::write_task_list(vault, &renderer, &entries, now) {
            Ok(_) => report.todo_generated = true,
            Err(err) => report.errors.push(format!("TODO generation: {err}")),
        }
    }

    report.completed_at = Some(Utc::now());
    save_report(vault, &report)?;
    tracing::info!(
        "sync finished: {} written, {} conflict(s) skipped, {} error(s)",
        report.written,
        report.skipped_conflicts,
        report.errors.len()
    );
    Ok(report)
}

/// Load settings and the token from `home`, then run against Canvas.
///
/// Missing token or malformed settings fail before anything is fetched.
pub fn run_configured(home: &Path) -> Result<SyncReport, SyncError> {
    let settings = settings::load_at(home)?;
    let vault = settings.vault_path_or_default(home);
    let token = credentials::require_token_at(home)?;
    let client = CanvasClient::new(&settings.canvas_url, &token)?;
    run_sync(&vault, &settings, &client, &HttpScraper::new(), Utc::now())
}
