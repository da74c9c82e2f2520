//! Vault layout: artifact paths, filename sanitization, state directory.
//!
//! ```text
//! <vault>/
//!   .coursevault/            sync_state.json, last_report.json, sync.lock, templates/
//!   TODO.md
//!   Courses/<course>/Assignments/<title>.md
//!   Courses/<course>/Events/<title>.md
//!   Courses/<course>/Pages/<title>.md
//!   Courses/<course>/Links/<title>.md
//!   Courses/<course>/Files/<folder>/<name>
//! ```

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use coursevault_core::{Course, ItemId, RemoteItem};

use crate::error::SyncError;

pub const STATE_DIR: &str = ".coursevault";
pub const COURSES_DIR: &str = "Courses";
pub const TASK_LIST_FILE: &str = "TODO.md";
/// Canvas's root file folder; its files go directly under `Files/`.
pub const ROOT_FILE_FOLDER: &str = "course files";
/// System folders that are never mirrored.
pub const SKIPPED_FILE_FOLDERS: &[&str] = &["course_image", "unfiled"];

const MAX_NAME_CHARS: usize = 100;
const FALLBACK_NAME: &str = "untitled";

static UNDERSCORE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{2,}").unwrap());
static WEEK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[Ww]eek\s*(\d+)").unwrap());

pub fn state_dir(vault: &Path) -> PathBuf {
    vault.join(STATE_DIR)
}

pub fn template_dir(vault: &Path) -> PathBuf {
    state_dir(vault).join("templates")
}

/// Safe single path component from an arbitrary title.
///
/// Reserved characters (`<>:"/\|?*`) and control characters become `_`,
/// runs of `_` collapse, leading/trailing spaces, underscores, and dots are
/// trimmed, and the result is capped at 100 characters. Never empty.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let collapsed = UNDERSCORE_RUN_RE.replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches(|c: char| c == ' ' || c == '_' || c == '.');
    let capped: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
    let capped = capped.trim_end_matches(|c: char| c == ' ' || c == '_' || c == '.');
    if capped.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        capped.to_string()
    }
}

/// `Week1`, `week 1` → `week 1`; anything else lowercased and trimmed.
pub fn normalize_folder_name(name: &str) -> String {
    match WEEK_RE.captures(name.trim()) {
        Some(caps) => format!("week {}", &caps[1]),
        None => name.trim().to_lowercase(),
    }
}

/// True for Canvas system folders that are never mirrored.
pub fn is_skipped_folder(name: &str) -> bool {
    let normalized = normalize_folder_name(name);
    SKIPPED_FILE_FOLDERS.contains(&normalized.as_str())
}

pub fn course_folder(course: &Course) -> String {
    sanitize_filename(&course.display_name())
}

/// Vault-relative artifact path for `item`, `/`-separated.
pub fn artifact_rel_path(item: &RemoteItem, course: &Course) -> String {
    let base = format!(
        "{COURSES_DIR}/{}/{}",
        course_folder(course),
        item.kind().folder_name()
    );
    match item {
        RemoteItem::File(f) => {
            let folder = normalize_folder_name(&f.folder_name);
            let name = sanitize_filename(&f.display_name);
            if folder.is_empty() || folder == ROOT_FILE_FOLDER {
                format!("{base}/{name}")
            } else {
                format!("{base}/{}/{name}", sanitize_filename(&folder))
            }
        }
        other => format!("{base}/{}.md", sanitize_filename(other.title())),
    }
}

/// Insert ` (<id>)` before the extension of the last component:
/// `Assignments/HW 1.md` → `Assignments/HW 1 (1234).md`.
///
/// Only the final dot counts as the extension, so `archive.tar.gz` becomes
/// `archive.tar (1234).gz`.
pub fn disambiguate(rel: &str, id: &ItemId) -> String {
    let (dir, file) = match rel.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, rel),
    };
    let suffix = sanitize_filename(&id.0);
    let renamed = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({suffix}).{ext}"),
        _ => format!("{file} ({suffix})"),
    };
    match dir {
        Some(dir) => format!("{dir}/{renamed}"),
        None => renamed,
    }
}

/// Absolute path for a vault-relative artifact path. Every component must be
/// a plain name so the result stays inside `vault`.
pub fn resolve_in_vault(vault: &Path, rel: &str) -> Result<PathBuf, SyncError> {
    let rel_path = Path::new(rel);
    let mut out = vault.to_path_buf();
    let mut any = false;
    for component in rel_path.components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                any = true;
            }
            _ => return Err(SyncError::UnsafePath(rel.to_string())),
        }
    }
    if !any {
        return Err(SyncError::UnsafePath(rel.to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursevault_core::{Assignment, CourseId, RemoteFile};
    use rstest::rstest;

    #[rstest]
    #[case("Homework 1", "Homework 1")]
    #[case("HW 1: Intro/Setup?", "HW 1_ Intro_Setup")]
    #[case("a<<>>b", "a_b")]
    #[case("  __..hidden..__  ", "hidden")]
    #[case("", "untitled")]
    #[case("???", "untitled")]
    #[case("..", "untitled")]
    #[case("tab\there", "tab_here")]
    fn sanitize_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_filename(input), expected);
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(250);
        assert_eq!(sanitize_filename(&long).chars().count(), 100);
    }

    #[rstest]
    #[case("Week1", "week 1")]
    #[case("week 12", "week 12")]
    #[case("Week 3 Readings", "week 3")]
    #[case("Lecture Notes", "lecture notes")]
    #[case("course files", "course files")]
    fn folder_normalization(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_folder_name(input), expected);
    }

    #[test]
    fn system_folders_skipped() {
        assert!(is_skipped_folder("course_image"));
        assert!(is_skipped_folder("Unfiled"));
        assert!(!is_skipped_folder("course files"));
    }

    fn course() -> Course {
        Course {
            id: CourseId::from("42"),
            name: Some("CS 225: Data Structures".to_string()),
            course_code: None,
        }
    }

    #[test]
    fn assignment_path() {
        let item = RemoteItem::Assignment(Assignment {
            id: ItemId::from("1"),
            course_id: CourseId::from("42"),
            name: "MP 1 / Stickers".to_string(),
            description: None,
            due_at: None,
            points_possible: None,
            submission_types: vec![],
            html_url: None,
            updated_at: None,
            submission: None,
        });
        assert_eq!(
            artifact_rel_path(&item, &course()),
            "Courses/CS 225_ Data Structures/Assignments/MP 1 _ Stickers.md"
        );
    }

    #[test]
    fn file_paths_by_folder() {
        let mut file = RemoteFile {
            id: ItemId::from("9"),
            course_id: CourseId::from("42"),
            folder_name: "Week1".to_string(),
            display_name: "slides.pdf".to_string(),
            url: String::new(),
            size: None,
            content_type: None,
            updated_at: None,
        };
        assert_eq!(
            artifact_rel_path(&RemoteItem::File(file.clone()), &course()),
            "Courses/CS 225_ Data Structures/Files/week 1/slides.pdf"
        );
        file.folder_name = "course files".to_string();
        assert_eq!(
            artifact_rel_path(&RemoteItem::File(file), &course()),
            "Courses/CS 225_ Data Structures/Files/slides.pdf"
        );
    }

    #[test]
    fn disambiguation_keeps_extension() {
        assert_eq!(
            disambiguate("Courses/X/Assignments/HW 1.md", &ItemId::from("77")),
            "Courses/X/Assignments/HW 1 (77).md"
        );
        assert_eq!(disambiguate("README", &ItemId::from("1")), "README (1)");
        assert_eq!(
            disambiguate("Files/week 1/archive.tar.gz", &ItemId::from("9")),
            "Files/week 1/archive.tar (9).gz"
        );
        assert_eq!(disambiguate(".hidden", &ItemId::from("2")), ".hidden (2)");
    }

    #[test]
    fn resolve_rejects_escapes() {
        let vault = Path::new("/vault");
        assert_eq!(
            resolve_in_vault(vault, "Courses/A/x.md").unwrap(),
            PathBuf::from("/vault/Courses/A/x.md")
        );
        assert!(resolve_in_vault(vault, "../etc/passwd").is_err());
        assert!(resolve_in_vault(vault, "/etc/passwd").is_err());
        assert!(resolve_in_vault(vault, "").is_err());
    }
}
