//! Content fingerprints: SHA-256 over the exact artifact bytes, lowercase hex.

use std::io::ErrorKind;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Fingerprint of the file at `path`, `None` if it does not exist.
pub fn fingerprint_file(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(fingerprint(&bytes))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn known_digest() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn deterministic_and_byte_exact() {
        let a = fingerprint(b"line1\nline2\n");
        assert_eq!(a, fingerprint(b"line1\nline2\n"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint(b"line1\r\nline2\r\n"));
    }

    #[test]
    fn missing_file_has_no_fingerprint() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(fingerprint_file(&tmp.path().join("nope.md")).unwrap(), None);
        std::fs::write(tmp.path().join("a.md"), b"x").unwrap();
        assert_eq!(
            fingerprint_file(&tmp.path().join("a.md")).unwrap(),
            Some(fingerprint(b"x"))
        );
    }
}
