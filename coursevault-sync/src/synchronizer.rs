//! Item synchronizer: reconcile, render or download, write, record.

use std::path::Path;

use chrono::{DateTime, Utc};

use coursevault_canvas::LmsClient;
use coursevault_core::{timestamp, Course, ItemKind, RemoteItem, SyncRecord};
use coursevault_renderer::Renderer;

use crate::error::SyncError;
use crate::fingerprint::{fingerprint, fingerprint_file};
use crate::paths::{artifact_rel_path, disambiguate, resolve_in_vault};
use crate::reconcile::{decide, Verdict};
use crate::sources;
use crate::state_store::SyncStateStore;
use crate::writer::atomic_write;

/// Everything one run shares across units.
pub struct SyncContext<'a> {
    pub vault: &'a Path,
    pub renderer: &'a Renderer,
    pub client: &'a dyn LmsClient,
    /// Render time stamped into every header written this run.
    pub now: DateTime<Utc>,
}

/// Per-unit tallies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindOutcome {
    pub written: usize,
    pub skipped_conflicts: usize,
    /// Items whose sync failed; they stay candidates for the next run.
    pub failed: usize,
}

/// Artifact path for `item`: the recorded one if a record exists, else the
/// computed one, disambiguated when another record already owns it.
fn target_path(store: &SyncStateStore, item: &RemoteItem, course: &Course) -> String {
    if let Some(record) = store.get(item.kind(), item.id()) {
        return record.artifact_path.clone();
    }
    let rel = artifact_rel_path(item, course);
    match store.owner_of(&rel) {
        Some(_) => disambiguate(&rel, item.id()),
        None => rel,
    }
}

fn artifact_bytes(
    ctx: &SyncContext<'_>,
    item: &RemoteItem,
    course: &Course,
) -> Result<Vec<u8>, SyncError> {
    match item {
        RemoteItem::File(file) => Ok(ctx.client.download(&file.url)?),
        other => Ok(ctx.renderer.render_item(other, course, ctx.now)?.into_bytes()),
    }
}

/// Reconcile and, when warranted, write one item. Returns the verdict.
pub fn sync_item(
    ctx: &SyncContext<'_>,
    store: &mut SyncStateStore,
    course: &Course,
    item: &RemoteItem,
) -> Result<Verdict, SyncError> {
    let rel = target_path(store, item, course);
    if let Some(owner) = store.owner_of(&rel) {
        if owner.kind != item.kind() || &owner.remote_id != item.id() {
            return Err(SyncError::PathTaken {
                path: rel,
                owner_kind: owner.kind,
                owner_id: owner.remote_id.clone(),
            });
        }
    }
    let abs = resolve_in_vault(ctx.vault, &rel)?;

    let exists = abs.exists();
    let disk_fp = if exists {
        match fingerprint_file(&abs) {
            Ok(fp) => fp,
            Err(err) => {
                tracing::warn!("cannot fingerprint {}: {err}", abs.display());
                None
            }
        }
    } else {
        None
    };
    let record = store.get(item.kind(), item.id());
    let verdict = decide(exists, disk_fp.as_deref(), record, item.updated_at());

    if verdict == Verdict::LocalEditConflict {
        tracing::info!("local edits in {rel}; leaving it alone");
        return Ok(verdict);
    }
    if !verdict.should_write() {
        return Ok(verdict);
    }

    let bytes = artifact_bytes(ctx, item, course)?;
    atomic_write(&abs, &bytes)?;
    store.upsert(SyncRecord {
        remote_id: item.id().clone(),
        kind: item.kind(),
        course_id: item.course_id().or_else(|| Some(course.id.clone())),
        artifact_path: rel.clone(),
        content_fingerprint: fingerprint(&bytes),
        remote_updated_at: item.updated_at().and_then(timestamp::normalize),
        synced_at: ctx.now,
    })?;
    tracing::debug!("{verdict}: {rel}");
    Ok(verdict)
}

/// Sync a batch of items of one course. Failures are logged per item.
pub fn sync_items(
    ctx: &SyncContext<'_>,
    store: &mut SyncStateStore,
    course: &Course,
    items: &[RemoteItem],
) -> KindOutcome {
    let mut outcome = KindOutcome::default();
    for item in items {
        match sync_item(ctx, store, course, item) {
            Ok(Verdict::LocalEditConflict) => outcome.skipped_conflicts += 1,
            Ok(verdict) if verdict.should_write() => outcome.written += 1,
            Ok(_) => {}
            Err(err) => {
                outcome.failed += 1;
                tracing::warn!(
                    "failed to sync {} {} ({}): {err}",
                    item.kind(),
                    item.id(),
                    item.title()
                );
            }
        }
    }
    outcome
}

/// List one kind for one course and sync it. Returns `(written, skipped_conflicts)`.
pub fn sync_kind(
    ctx: &SyncContext<'_>,
    store: &mut SyncStateStore,
    course: &Course,
    kind: ItemKind,
) -> Result<(usize, usize), SyncError> {
    let items = sources::fetch_kind(ctx.client, &course.id, kind, ctx.now.date_naive())?;
    let outcome = sync_items(ctx, store, course, &items);
    Ok((outcome.written, outcome.skipped_conflicts))
}
