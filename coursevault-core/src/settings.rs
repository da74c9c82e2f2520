//! Persistent settings for coursevault.
//!
//! # Storage layout
//!
//! ```text
//! ~/.coursevault/
//!   config.yaml   (mode 0600, atomic save)
//!   token         (mode 0600, see `credentials`)
//! ```
//!
//! # API pattern
//!
//! Every I/O function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::CourseId;

pub const DEFAULT_CANVAS_URL: &str = "https://canvas.instructure.com";
pub const DEFAULT_SYNC_TIME: &str = "06:00";
pub const DEFAULT_VAULT_DIR: &str = "CourseVault";
pub const SETTINGS_VERSION: u32 = 1;

/// Keys accepted by [`Settings::get`] and [`Settings::set`].
pub const SETTING_KEYS: &[&str] = &[
    "canvas_url",
    "vault_path",
    "sync_time",
    "sync_files",
    "generate_todo",
];

/// One entry of the selection set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCourse {
    pub course_id: CourseId,
    pub course_name: String,
    pub selected_at: DateTime<Utc>,
}

/// A web page scraped for task links, independent of the LMS API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSource {
    /// Course label shown in the task list, e.g. `CS 225`.
    pub label: String,
    /// Page listing the tasks.
    pub url: String,
    /// Regex matched against `href` values; matching links are tasks.
    pub link_pattern: String,
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub version: u32,
    pub canvas_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_path: Option<PathBuf>,
    pub sync_time: String,
    #[serde(default)]
    pub selected_courses: Vec<SelectedCourse>,
    #[serde(default)]
    pub sync_files: bool,
    #[serde(default = "default_true")]
    pub generate_todo: bool,
    #[serde(default)]
    pub scrape_sources: Vec<ScrapeSource>,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: SETTINGS_VERSION,
            canvas_url: DEFAULT_CANVAS_URL.to_string(),
            vault_path: None,
            sync_time: DEFAULT_SYNC_TIME.to_string(),
            selected_courses: Vec::new(),
            sync_files: false,
            generate_todo: true,
            scrape_sources: Vec::new(),
        }
    }
}

impl Settings {
    /// Configured vault path, or `<home>/CourseVault`.
    pub fn vault_path_or_default(&self, home: &Path) -> PathBuf {
        self.vault_path
            .clone()
            .unwrap_or_else(|| home.join(DEFAULT_VAULT_DIR))
    }

    /// Replace the selection set wholesale. Prior selections are dropped.
    pub fn set_selected_courses(&mut self, courses: Vec<(CourseId, String)>) {
        let now = Utc::now();
        self.selected_courses = courses
            .into_iter()
            .map(|(course_id, course_name)| SelectedCourse {
                course_id,
                course_name,
                selected_at: now,
            })
            .collect();
    }

    /// Parsed daily sync time.
    pub fn sync_time(&self) -> Result<NaiveTime, ConfigError> {
        parse_sync_time(&self.sync_time)
    }

    /// Read a scalar setting as a string.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        match key {
            "canvas_url" => Ok(self.canvas_url.clone()),
            "vault_path" => Ok(self
                .vault_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()),
            "sync_time" => Ok(self.sync_time.clone()),
            "sync_files" => Ok(self.sync_files.to_string()),
            "generate_todo" => Ok(self.generate_todo.to_string()),
            other => Err(ConfigError::UnknownKey(other.to_string())),
        }
    }

    /// Validate and set a scalar setting from a string.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "canvas_url" => {
                if !(value.starts_with("https://") || value.starts_with("http://")) {
                    return Err(invalid(key, value, "expected an http(s) URL"));
                }
                self.canvas_url = value.trim_end_matches('/').to_string();
            }
            "vault_path" => {
                if value.is_empty() {
                    return Err(invalid(key, value, "path must not be empty"));
                }
                self.vault_path = Some(PathBuf::from(value));
            }
            "sync_time" => {
                let time = parse_sync_time(value)?;
                self.sync_time = time.format("%H:%M").to_string();
            }
            "sync_files" => self.sync_files = parse_bool(key, value)?,
            "generate_todo" => self.generate_todo = parse_bool(key, value)?,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

/// Parse a daily sync time in 24-hour `HH:MM` form.
pub fn parse_sync_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| invalid("sync_time", value, &format!("expected HH:MM ({e})")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.coursevault/`
pub fn config_dir_at(home: &Path) -> PathBuf {
    home.join(".coursevault")
}

/// `<home>/.coursevault/config.yaml`: pure, no I/O.
pub fn settings_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("config.yaml")
}

/// Create `<home>/.coursevault/` (mode `0700`) if it does not yet exist.
pub(crate) fn ensure_config_dir_at(home: &Path) -> Result<PathBuf, ConfigError> {
    let dir = config_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load settings. Returns defaults if the file does not exist yet.
///
/// Returns `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<Settings, ConfigError> {
    let path = settings_path_at(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, ConfigError> {
    load_at(&home()?)
}

/// Atomically save settings.
///
/// Write flow: serialize → `config.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, settings: &Settings) -> Result<(), ConfigError> {
    ensure_config_dir_at(home)?;
    let path = settings_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(settings)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(settings: &Settings) -> Result<(), ConfigError> {
    save_at(&home()?, settings)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// The current user's home directory.
pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
pub(crate) fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
pub(crate) fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_missing() {
        let home = TempDir::new().expect("home");
        let settings = load_at(home.path()).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sync_time, DEFAULT_SYNC_TIME);
        assert!(settings.generate_todo);
    }

    #[test]
    fn save_and_load_roundtrip_cleans_tmp() {
        let home = TempDir::new().expect("home");
        let mut settings = Settings::default();
        settings.set("sync_time", "7:05").expect("set time");
        settings.set_selected_courses(vec![(CourseId::from("65270"), "STAT 410".to_string())]);
        save_at(home.path(), &settings).expect("save");

        let loaded = load_at(home.path()).expect("load");
        assert_eq!(loaded, settings);
        assert_eq!(loaded.sync_time, "07:05");
        assert!(!settings_path_at(home.path())
            .with_file_name("config.yaml.tmp")
            .exists());
    }

    #[test]
    #[cfg(unix)]
    fn settings_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let home = TempDir::new().expect("home");
        save_at(home.path(), &Settings::default()).expect("save");
        let mode = std::fs::metadata(settings_path_at(home.path()))
            .expect("meta")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn selection_is_replaced_not_merged() {
        let mut settings = Settings::default();
        settings.set_selected_courses(vec![
            (CourseId::from("1"), "A".to_string()),
            (CourseId::from("2"), "B".to_string()),
        ]);
        settings.set_selected_courses(vec![(CourseId::from("3"), "C".to_string())]);
        assert_eq!(settings.selected_courses.len(), 1);
        assert_eq!(settings.selected_courses[0].course_id, CourseId::from("3"));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("sync_time", "25:00"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            settings.set("canvas_url", "canvas.example.edu"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            settings.set("colour", "blue"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn canvas_url_trailing_slash_trimmed() {
        let mut settings = Settings::default();
        settings
            .set("canvas_url", "https://canvas.illinois.edu/")
            .expect("set");
        assert_eq!(settings.get("canvas_url").unwrap(), "https://canvas.illinois.edu");
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let home = TempDir::new().expect("home");
        ensure_config_dir_at(home.path()).expect("dir");
        std::fs::write(settings_path_at(home.path()), "version: [oops").expect("write");
        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn vault_path_defaults_under_home() {
        let settings = Settings::default();
        let home = Path::new("/home/student");
        assert_eq!(
            settings.vault_path_or_default(home),
            PathBuf::from("/home/student/CourseVault")
        );
    }
}
