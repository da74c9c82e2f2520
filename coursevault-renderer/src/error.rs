//! Error types for coursevault-renderer.

use std::path::PathBuf;

use thiserror::Error;

use coursevault_core::ItemKind;

/// All errors that can arise from rendering an artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Metadata header could not be emitted as YAML.
    #[error("metadata header error: {0}")]
    Header(#[from] serde_yaml::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// The kind is mirrored as raw bytes and has no text rendering.
    #[error("{0} items are not rendered as text")]
    NotRenderable(ItemKind),
}
