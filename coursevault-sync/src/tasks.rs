//! Task list aggregation and `TODO.md` generation.
//!
//! Remote assignments with a due date and scraped task links are merged
//! into one list, sorted by due date with undated entries last. The sort is
//! stable, so equal keys keep source order. There is no deduplication
//! across sources.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use coursevault_canvas::{ScrapedTask, TaskScraper};
use coursevault_core::{timestamp, Assignment, ScrapeSource};
use coursevault_renderer::dates::format_task_due;
use coursevault_renderer::{derive_status, AssignmentStatus, Renderer, TaskLine};

use crate::error::SyncError;
use crate::paths::TASK_LIST_FILE;
use crate::writer::atomic_write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub course: String,
    pub name: String,
    pub due_at: Option<String>,
    pub status: AssignmentStatus,
    pub url: Option<String>,
}

impl TaskEntry {
    /// `None` for assignments without a due date.
    pub fn from_assignment(assignment: &Assignment, course_name: &str) -> Option<Self> {
        let due_at = assignment.due_at.as_deref().filter(|d| !d.trim().is_empty())?;
        Some(TaskEntry {
            course: course_name.to_string(),
            name: assignment.name.clone(),
            due_at: Some(due_at.to_string()),
            status: derive_status(assignment.submission.as_ref()),
            url: assignment.html_url.clone(),
        })
    }

    /// Scraped tasks carry no due date and are always pending.
    pub fn from_scraped(task: &ScrapedTask) -> Self {
        TaskEntry {
            course: task.source.clone(),
            name: task.title.clone(),
            due_at: None,
            status: AssignmentStatus::Pending,
            url: Some(task.url.clone()),
        }
    }

    fn sort_key(&self) -> (bool, Option<DateTime<Utc>>) {
        let due = self.due_at.as_deref().and_then(timestamp::normalize);
        (due.is_none(), due)
    }

    pub fn to_line(&self) -> TaskLine {
        TaskLine {
            done: self.status.is_done(),
            course: self.course.clone(),
            name: self.name.clone(),
            due: format_task_due(self.due_at.as_deref()),
            url: self.url.clone(),
        }
    }
}

/// Concatenate both sources and sort by due date, undated last.
pub fn merge_tasks(remote: Vec<TaskEntry>, scraped: Vec<TaskEntry>) -> Vec<TaskEntry> {
    let mut all = remote;
    all.extend(scraped);
    all.sort_by_key(TaskEntry::sort_key);
    all
}

/// Scrape every source; failures are appended to `errors` as
/// `Scrape <label>: <error>` and do not stop the others.
pub fn collect_scraped(
    scraper: &dyn TaskScraper,
    sources: &[ScrapeSource],
    errors: &mut Vec<String>,
) -> Vec<TaskEntry> {
    let mut entries = Vec::new();
    for source in sources {
        match scraper.scrape(source) {
            Ok(tasks) => entries.extend(tasks.iter().map(TaskEntry::from_scraped)),
            Err(err) => {
                tracing::warn!("scrape of {} failed: {err}", source.label);
                errors.push(format!("Scrape {}: {err}", source.label));
            }
        }
    }
    entries
}

pub fn task_list_path(vault: &Path) -> PathBuf {
    vault.join(TASK_LIST_FILE)
}

/// Render `entries` (already ordered) into `<vault>/TODO.md`.
pub fn write_task_list(
    vault: &Path,
    renderer: &Renderer,
    entries: &[TaskEntry],
    now: DateTime<Utc>,
) -> Result<PathBuf, SyncError> {
    let lines: Vec<TaskLine> = entries.iter().map(TaskEntry::to_line).collect();
    let text = renderer.render_task_list(&lines, now)?;
    let path = task_list_path(vault);
    atomic_write(&path, text.as_bytes())?;
    tracing::info!("task list: {} task(s) in {}", entries.len(), path.display());
    Ok(path)
}
