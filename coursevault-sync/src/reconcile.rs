//! Write/skip decision for one artifact.
//!
//! First match wins:
//! 1. no artifact on disk → `New`
//! 2. artifact but no record → `StaleRecord`
//! 3. disk fingerprint differs from the record → `LocalEditConflict`
//! 4. remote timestamp newer than the recorded one → `RemoteUpdated`
//! 5. otherwise → `UpToDate`
//!
//! Only `New`, `StaleRecord`, and `RemoteUpdated` write. A missing or
//! unparseable timestamp on either side is no evidence of change.

use std::fmt;

use coursevault_core::{timestamp, SyncRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    New,
    StaleRecord,
    LocalEditConflict,
    RemoteUpdated,
    UpToDate,
}

impl Verdict {
    pub fn should_write(&self) -> bool {
        matches!(
            self,
            Verdict::New | Verdict::StaleRecord | Verdict::RemoteUpdated
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::New => "new",
            Verdict::StaleRecord => "stale_record",
            Verdict::LocalEditConflict => "local_edit_conflict",
            Verdict::RemoteUpdated => "remote_updated",
            Verdict::UpToDate => "up_to_date",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide what to do with one artifact.
///
/// `disk_fingerprint` is `None` when the artifact exists but could not be
/// read; that is treated as a local edit.
pub fn decide(
    artifact_exists: bool,
    disk_fingerprint: Option<&str>,
    record: Option<&SyncRecord>,
    remote_updated_at: Option<&str>,
) -> Verdict {
    if !artifact_exists {
        return Verdict::New;
    }
    let Some(record) = record else {
        return Verdict::StaleRecord;
    };
    if disk_fingerprint != Some(record.content_fingerprint.as_str()) {
        return Verdict::LocalEditConflict;
    }
    let remote = remote_updated_at.and_then(timestamp::normalize);
    match (remote, record.remote_updated_at) {
        (Some(remote), Some(recorded)) if remote > recorded => Verdict::RemoteUpdated,
        _ => Verdict::UpToDate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use coursevault_core::{CourseId, ItemId, ItemKind};
    use rstest::rstest;

    fn record(fp: &str, remote: Option<&str>) -> SyncRecord {
        SyncRecord {
            remote_id: ItemId::from("1"),
            kind: ItemKind::Assignment,
            course_id: Some(CourseId::from("42")),
            artifact_path: "a.md".to_string(),
            content_fingerprint: fp.to_string(),
            remote_updated_at: remote.and_then(timestamp::normalize),
            synced_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn missing_artifact_is_new_even_with_record() {
        let r = record("abc", None);
        assert_eq!(decide(false, None, Some(&r), None), Verdict::New);
        assert_eq!(decide(false, None, None, None), Verdict::New);
    }

    #[test]
    fn artifact_without_record_is_stale() {
        assert_eq!(decide(true, Some("abc"), None, None), Verdict::StaleRecord);
    }

    #[test]
    fn local_edit_wins_over_remote_update() {
        let r = record("abc", Some("2026-01-01T00:00:00Z"));
        let v = decide(true, Some("edited"), Some(&r), Some("2026-06-01T00:00:00Z"));
        assert_eq!(v, Verdict::LocalEditConflict);
        assert!(!v.should_write());
    }

    #[test]
    fn unreadable_artifact_is_a_conflict() {
        let r = record("abc", None);
        assert_eq!(decide(true, None, Some(&r), None), Verdict::LocalEditConflict);
    }

    #[rstest]
    #[case(Some("2026-01-01T00:00:00Z"), Some("2026-01-02T00:00:00Z"), Verdict::RemoteUpdated)]
    #[case(Some("2026-01-01T00:00:00Z"), Some("2026-01-01T00:00:00Z"), Verdict::UpToDate)]
    #[case(Some("2026-01-02T00:00:00Z"), Some("2026-01-01T00:00:00Z"), Verdict::UpToDate)]
    #[case(None, Some("2026-01-02T00:00:00Z"), Verdict::UpToDate)]
    #[case(Some("2026-01-01T00:00:00Z"), None, Verdict::UpToDate)]
    #[case(Some("2026-01-01T00:00:00Z"), Some("next tuesday"), Verdict::UpToDate)]
    // Same instant in a different offset is not newer.
    #[case(Some("2026-01-01T00:00:00Z"), Some("2025-12-31T18:00:00-06:00"), Verdict::UpToDate)]
    #[case(Some("2026-01-01T00:00:00Z"), Some("2026-01-01T00:00:00-06:00"), Verdict::RemoteUpdated)]
    fn timestamp_comparison(
        #[case] recorded: Option<&str>,
        #[case] remote: Option<&str>,
        #[case] expected: Verdict,
    ) {
        let r = record("abc", recorded);
        assert_eq!(decide(true, Some("abc"), Some(&r), remote), expected);
    }

    #[test]
    fn write_set() {
        assert!(Verdict::New.should_write());
        assert!(Verdict::StaleRecord.should_write());
        assert!(Verdict::RemoteUpdated.should_write());
        assert!(!Verdict::UpToDate.should_write());
        assert!(!Verdict::LocalEditConflict.should_write());
    }
}
