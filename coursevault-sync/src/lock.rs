//! Per-vault run lock on `<vault>/.coursevault/sync.lock`.
//!
//! The file carries an exclusive advisory lock for as long as the guard
//! lives. The kernel drops that lock when the holder exits for any reason,
//! so a file left behind by a killed run does not block the next one.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{io_err, SyncError};
use crate::paths::state_dir;

pub fn lock_path(vault: &Path) -> PathBuf {
    state_dir(vault).join("sync.lock")
}

/// Held for the duration of one sync run.
#[derive(Debug)]
pub struct VaultLock {
    path: PathBuf,
    file: File,
}

impl VaultLock {
    /// Fails with [`SyncError::Locked`] if a live run holds the lock.
    pub fn acquire(vault: &Path) -> Result<Self, SyncError> {
        let dir = state_dir(vault);
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        let path = lock_path(vault);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| io_err(&path, e))?;
        if let Err(err) = file.try_lock_exclusive() {
            if err.kind() == fs2::lock_contended_error().kind() {
                return Err(SyncError::Locked(path));
            }
            return Err(io_err(&path, err));
        }

        if let Err(err) = write_owner(&mut file) {
            tracing::warn!("cannot record owner in {}: {err}", path.display());
        }
        Ok(VaultLock { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Replace whatever pid a previous holder left with ours.
fn write_owner(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())
}

impl Drop for VaultLock {
    fn drop(&mut self) {
        // The file stays; only the lock is released.
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!("failed to unlock {}: {err}", self.path.display());
        }
    }
}
