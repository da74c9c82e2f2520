//! Vault scan for `coursevault status`.
//!
//! Every sync record is checked against its artifact on disk:
//! `Missing` (deleted, rewritten next run), `Modified` (local edits, skipped
//! as a conflict), or `Current`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use coursevault_core::{ItemId, ItemKind};

use crate::error::SyncError;
use crate::fingerprint::fingerprint_file;
use crate::paths::resolve_in_vault;
use crate::state_store::{store_path, SyncStateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactState {
    Current,
    Modified,
    Missing,
}

impl ArtifactState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactState::Current => "current",
            ArtifactState::Modified => "modified",
            ArtifactState::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStatus {
    pub kind: ItemKind,
    pub remote_id: ItemId,
    pub artifact_path: String,
    pub state: ArtifactState,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultScan {
    /// No state store yet, or an empty one.
    pub never_synced: bool,
    /// When the store was last saved.
    pub last_saved: Option<DateTime<Utc>>,
    pub artifacts: Vec<ArtifactStatus>,
}

impl VaultScan {
    pub fn count(&self, state: ArtifactState) -> usize {
        self.artifacts.iter().filter(|a| a.state == state).count()
    }

    pub fn with_state(&self, state: ArtifactState) -> impl Iterator<Item = &ArtifactStatus> {
        self.artifacts.iter().filter(move |a| a.state == state)
    }
}

pub fn scan(vault: &Path) -> Result<VaultScan, SyncError> {
    let existed = store_path(vault).exists();
    let store = SyncStateStore::load(vault)?;

    let mut artifacts = Vec::with_capacity(store.len());
    for record in store.records() {
        let state = match resolve_in_vault(vault, &record.artifact_path) {
            Ok(abs) => match fingerprint_file(&abs) {
                Ok(None) => ArtifactState::Missing,
                Ok(Some(fp)) if fp == record.content_fingerprint => ArtifactState::Current,
                Ok(Some(_)) => ArtifactState::Modified,
                Err(err) => {
                    tracing::warn!("cannot read {}: {err}", abs.display());
                    ArtifactState::Modified
                }
            },
            Err(err) => {
                tracing::warn!("ignoring record with unusable path: {err}");
                continue;
            }
        };
        artifacts.push(ArtifactStatus {
            kind: record.kind,
            remote_id: record.remote_id.clone(),
            artifact_path: record.artifact_path.clone(),
            state,
            synced_at: record.synced_at,
        });
    }
    artifacts.sort_by(|a, b| a.artifact_path.cmp(&b.artifact_path));

    Ok(VaultScan {
        never_synced: !existed || store.is_empty(),
        last_saved: store.updated_at(),
        artifacts,
    })
}

/// Compact age such as `45s`, `3m`, `2h`, `5d`.
pub fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds().max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
