//! Atomic artifact writes.
//!
//! Bytes go to `<path>.coursevault.tmp` next to the target, then a rename
//! replaces the target. Parents are created first. A failed rename removes
//! the tmp file and leaves any existing artifact untouched.

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

fn tmp_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.coursevault.tmp", path.display()))
}

/// Write `bytes` to `path` atomically.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    atomic_write_with_tmp(path, bytes, &tmp_path_for(path))
}

fn atomic_write_with_tmp(path: &Path, bytes: &[u8], tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, bytes).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    tracing::debug!("wrote: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Courses").join("CS 225").join("Assignments").join("HW.md");
        atomic_write(&path, b"content").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"content");
    }

    #[test]
    fn replaces_existing_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.md");
        atomic_write(&path, b"v1").unwrap();
        atomic_write(&path, b"v2").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clean.md");
        atomic_write(&path, b"data").unwrap();
        assert!(!tmp_path_for(&path).exists(), ".coursevault.tmp must be cleaned up");
    }

    #[test]
    fn bytes_written_verbatim() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("slides.pdf");
        let payload = [0u8, 159, 146, 150, b'\r', b'\n'];
        atomic_write(&path, &payload).unwrap();
        assert_eq!(fs::read(&path).unwrap(), payload);
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();

        let path = readonly_dir.join("HW.md");
        fs::write(&path, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp_path = tmp_dir.path().join("HW.md.coursevault.tmp");

        let result = atomic_write_with_tmp(&path, b"new content", &tmp_path);

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Running as root ignores directory permissions; nothing to assert then.
        if result.is_ok() {
            return;
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!tmp_path.exists(), ".coursevault.tmp should be cleaned up");
    }
}
