//! Size-based rotation of the daemon log files.
//!
//! The daemon's stdout and stderr are appended to `daemon.log` and
//! `daemon-err.log` by whoever spawned it, so the live file is never
//! renamed: it is copied to `<name>.1` and truncated in place.
//! Older copies shift up, `<name>.1` → `<name>.2` …, the last one dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::paths::{stderr_log_path, stdout_log_path};

pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_ROTATED_FILES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub keep: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_LOG_BYTES,
            keep: MAX_ROTATED_FILES,
        }
    }
}

impl RotationPolicy {
    /// Rotate `log` if it has reached `max_bytes`. Returns whether it did.
    ///
    /// A missing log is not an error.
    pub fn rotate(&self, log: &Path) -> io::Result<bool> {
        let size = match fs::metadata(log) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err),
        };
        if size < self.max_bytes || self.keep == 0 {
            return Ok(false);
        }

        for n in (1..self.keep).rev() {
            let from = rotated_path(log, n);
            if from.exists() {
                fs::rename(&from, rotated_path(log, n + 1))?;
            }
        }
        fs::copy(log, rotated_path(log, 1))?;
        fs::OpenOptions::new().write(true).truncate(true).open(log)?;
        Ok(true)
    }
}

/// `daemon.log` → `daemon.log.<n>`
pub fn rotated_path(log: &Path, n: usize) -> PathBuf {
    let mut name = log.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{n}"));
    log.with_file_name(name)
}

/// Rotate both daemon logs under `home`. Failures are logged, never raised.
pub fn rotate_daemon_logs(home: &Path) {
    let policy = RotationPolicy::default();
    for log in [stdout_log_path(home), stderr_log_path(home)] {
        match policy.rotate(&log) {
            Ok(true) => tracing::info!(path = %log.display(), "log file rotated"),
            Ok(false) => {}
            Err(err) => tracing::warn!(path = %log.display(), error = %err, "log rotation failed"),
        }
    }
}
