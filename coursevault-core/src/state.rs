//! Persistent sync bookkeeping shared by the engine, daemon, and CLI.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CourseId, ItemId, ItemKind};

/// Baseline for one remote item: where its artifact lives and what was
/// written there last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub remote_id: ItemId,
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    /// Vault-relative, `/`-separated.
    pub artifact_path: String,
    /// SHA-256 hex of the bytes last written.
    pub content_fingerprint: String,
    /// Remote last-modified at the time of that write, in UTC.
    #[serde(default)]
    pub remote_updated_at: Option<DateTime<Utc>>,
    pub synced_at: DateTime<Utc>,
}

/// Outcome of one orchestrated sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Artifacts written, all kinds.
    pub written: usize,
    /// Artifacts left alone because they were edited locally.
    pub skipped_conflicts: usize,
    pub assignments: usize,
    pub events: usize,
    pub pages: usize,
    pub links: usize,
    pub files: usize,
    /// Display names of the courses whose every unit succeeded.
    #[serde(default)]
    pub courses_synced: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub todo_generated: bool,
}

impl SyncReport {
    /// Count `n` written artifacts of `kind`.
    pub fn add_written(&mut self, kind: ItemKind, n: usize) {
        self.written += n;
        let slot = match kind {
            ItemKind::Assignment => &mut self.assignments,
            ItemKind::CalendarEvent => &mut self.events,
            ItemKind::Page => &mut self.pages,
            ItemKind::ExternalLink => &mut self.links,
            ItemKind::File => &mut self.files,
        };
        *slot += n;
    }

    pub fn written_by_kind(&self) -> BTreeMap<ItemKind, usize> {
        ItemKind::all()
            .iter()
            .map(|k| {
                let n = match k {
                    ItemKind::Assignment => self.assignments,
                    ItemKind::CalendarEvent => self.events,
                    ItemKind::Page => self.pages,
                    ItemKind::ExternalLink => self.links,
                    ItemKind::File => self.files,
                };
                (*k, n)
            })
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
