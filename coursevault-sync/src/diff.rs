//! Unified diff for `coursevault diff`: what a refresh would change in one
//! artifact, typically a locally edited one the sync keeps skipping.

use std::io::ErrorKind;
use std::path::Path;

use chrono::Utc;
use similar::TextDiff;

use coursevault_canvas::LmsClient;
use coursevault_core::{ItemId, ItemKind};
use coursevault_renderer::{RenderError, Renderer};

use crate::error::{io_err, SyncError};
use crate::paths::{resolve_in_vault, template_dir};
use crate::sources;
use crate::state_store::SyncStateStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDiff {
    pub artifact_path: String,
    pub unified_diff: String,
}

/// Diff the on-disk artifact of `(kind, id)` against a fresh render.
///
/// The fresh render is stamped with the record's `synced_at`, so the header
/// timestamp alone never shows up as a change. `None` when identical.
pub fn diff_artifact(
    vault: &Path,
    client: &dyn LmsClient,
    kind: ItemKind,
    id: &ItemId,
) -> Result<Option<ArtifactDiff>, SyncError> {
    if kind == ItemKind::File {
        return Err(RenderError::NotRenderable(kind).into());
    }
    let store = SyncStateStore::load(vault)?;
    let record = store.get(kind, id).ok_or_else(|| SyncError::UnknownRecord {
        kind,
        id: id.clone(),
    })?;
    let course_id = record.course_id.clone().ok_or_else(|| SyncError::RemoteItemGone {
        kind,
        id: id.clone(),
    })?;

    let course = client.get_course(&course_id)?;
    let item = sources::fetch_kind(client, &course_id, kind, Utc::now().date_naive())?
        .into_iter()
        .find(|item| item.id() == id)
        .ok_or_else(|| SyncError::RemoteItemGone {
            kind,
            id: id.clone(),
        })?;

    let renderer = Renderer::with_template_dir(&template_dir(vault))?;
    let rendered = renderer.render_item(&item, &course, record.synced_at)?;

    let abs = resolve_in_vault(vault, &record.artifact_path)?;
    let existing = match std::fs::read_to_string(&abs) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => return Err(io_err(&abs, err)),
    };
    Ok(unified(&record.artifact_path, &existing, &rendered))
}

/// `a/<path>` is the vault copy, `b/<path>` the fresh render.
pub fn unified(artifact_path: &str, existing: &str, rendered: &str) -> Option<ArtifactDiff> {
    if existing == rendered {
        return None;
    }
    let old_header = format!("a/{artifact_path}");
    let new_header = format!("b/{artifact_path}");
    let unified_diff = TextDiff::from_lines(existing, rendered)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();
    Some(ArtifactDiff {
        artifact_path: artifact_path.to_string(),
        unified_diff,
    })
}
