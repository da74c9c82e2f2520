//! Errors raised by the scheduler, the sync queue and the socket protocol.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    /// Socket, log file or runtime setup failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings or token could not be loaded for a run.
    #[error(transparent)]
    Config(#[from] coursevault_core::ConfigError),

    /// The sync run itself failed before producing a report.
    #[error(transparent)]
    Sync(#[from] coursevault_sync::SyncError),

    #[error("malformed daemon message: {0}")]
    Json(#[from] serde_json::Error),

    /// The processor stopped before the job was queued or answered.
    #[error("{0} closed; the daemon is shutting down")]
    QueueClosed(&'static str),

    /// The daemon answered `ok: false`, or sent an unusable reply.
    #[error("daemon replied with an error: {0}")]
    Protocol(String),

    #[error("coursevault daemon is not running (no socket at {socket})")]
    DaemonNotRunning { socket: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
