//! Error types for coursevault-sync.

use std::path::PathBuf;

use thiserror::Error;

use coursevault_canvas::CanvasError;
use coursevault_core::{ConfigError, ItemId, ItemKind};
use coursevault_renderer::RenderError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("canvas error: {0}")]
    Canvas(#[from] CanvasError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (state store, report).
    #[error("sync state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A computed artifact path would leave the vault subtree.
    #[error("artifact path escapes the vault: {0}")]
    UnsafePath(String),

    /// Two records would share one artifact path.
    #[error("artifact path {path} already belongs to {owner_kind} {owner_id}")]
    PathTaken {
        path: String,
        owner_kind: ItemKind,
        owner_id: ItemId,
    },

    /// Another sync holds the vault lock.
    #[error("another sync is already running (lock file {0})")]
    Locked(PathBuf),

    #[error("no sync record for {kind} {id}")]
    UnknownRecord { kind: ItemKind, id: ItemId },

    /// The remote source no longer lists an item that has a record.
    #[error("{kind} {id} is no longer listed remotely")]
    RemoteItemGone { kind: ItemKind, id: ItemId },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
