//! Sync-state store: one [`SyncRecord`] per (kind, remote id).
//!
//! Persists a JSON document at `<vault>/.coursevault/sync_state.json`.
//! Writes use an atomic `.tmp` + rename. Artifact paths are unique across
//! records; [`SyncStateStore::upsert`] refuses a second owner for a path.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursevault_core::{ItemId, ItemKind, SyncRecord};

use crate::error::{io_err, SyncError};
use crate::paths::state_dir;

pub const STORE_VERSION: u32 = 1;

type RecordKey = (ItemKind, ItemId);

/// On-disk payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStateFile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub records: Vec<SyncRecord>,
}

fn default_version() -> u32 {
    STORE_VERSION
}

/// `<vault>/.coursevault/sync_state.json`
pub fn store_path(vault: &Path) -> PathBuf {
    state_dir(vault).join("sync_state.json")
}

/// In-memory store with a path index.
#[derive(Debug)]
pub struct SyncStateStore {
    path: PathBuf,
    updated_at: Option<DateTime<Utc>>,
    records: BTreeMap<RecordKey, SyncRecord>,
    by_path: HashMap<String, RecordKey>,
}

impl SyncStateStore {
    /// Load the store for `vault`; empty if the file does not yet exist.
    pub fn load(vault: &Path) -> Result<Self, SyncError> {
        let path = store_path(vault);
        let file = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            serde_json::from_str::<SyncStateFile>(&contents)?
        } else {
            SyncStateFile {
                version: STORE_VERSION,
                updated_at: None,
                records: Vec::new(),
            }
        };

        let mut store = SyncStateStore {
            path,
            updated_at: file.updated_at,
            records: BTreeMap::new(),
            by_path: HashMap::new(),
        };
        for record in file.records {
            if let Err(err) = store.upsert(record) {
                tracing::warn!("dropping inconsistent sync record: {err}");
            }
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the store was last saved, if ever.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn get(&self, kind: ItemKind, id: &ItemId) -> Option<&SyncRecord> {
        self.records.get(&(kind, id.clone()))
    }

    /// Record currently owning `artifact_path`, if any.
    pub fn owner_of(&self, artifact_path: &str) -> Option<&SyncRecord> {
        self.by_path
            .get(artifact_path)
            .and_then(|key| self.records.get(key))
    }

    /// Insert or replace the record for `(record.kind, record.remote_id)`.
    ///
    /// Fails if a different record already owns `record.artifact_path`.
    pub fn upsert(&mut self, record: SyncRecord) -> Result<(), SyncError> {
        let key = (record.kind, record.remote_id.clone());
        if let Some(owner) = self.by_path.get(&record.artifact_path) {
            if owner != &key {
                return Err(SyncError::PathTaken {
                    path: record.artifact_path.clone(),
                    owner_kind: owner.0,
                    owner_id: owner.1.clone(),
                });
            }
        }
        if let Some(previous) = self.records.get(&key) {
            if previous.artifact_path != record.artifact_path {
                self.by_path.remove(&previous.artifact_path);
            }
        }
        self.by_path.insert(record.artifact_path.clone(), key.clone());
        self.records.insert(key, record);
        Ok(())
    }

    pub fn remove(&mut self, kind: ItemKind, id: &ItemId) -> Option<SyncRecord> {
        let removed = self.records.remove(&(kind, id.clone()))?;
        self.by_path.remove(&removed.artifact_path);
        Some(removed)
    }

    /// Records ordered by kind, then id.
    pub fn records(&self) -> impl Iterator<Item = &SyncRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Save atomically: write `<path>.tmp`, then rename over `<path>`.
    pub fn save(&mut self) -> Result<(), SyncError> {
        let Some(dir) = self.path.parent() else {
            return Err(io_err(
                &self.path,
                std::io::Error::other("invalid sync state path"),
            ));
        };
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let now = Utc::now();
        let file = SyncStateFile {
            version: STORE_VERSION,
            updated_at: Some(now),
            records: self.records.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        self.updated_at = Some(now);
        Ok(())
    }
}

/// Delete the record for `(kind, id)` so the next run treats its artifact
/// as untracked and rewrites it.
pub fn forget(vault: &Path, kind: ItemKind, id: &ItemId) -> Result<SyncRecord, SyncError> {
    let mut store = SyncStateStore::load(vault)?;
    let removed = store.remove(kind, id).ok_or_else(|| SyncError::UnknownRecord {
        kind,
        id: id.clone(),
    })?;
    store.save()?;
    tracing::info!("forgot {kind} {id} ({})", removed.artifact_path);
    Ok(removed)
}
