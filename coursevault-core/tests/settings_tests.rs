//! Settings file behaviour seen from outside the crate.

use coursevault_core::{
    settings::{self, Settings, SETTING_KEYS},
    ConfigError, CourseId,
};
use rstest::rstest;
use tempfile::TempDir;

#[rstest]
#[case("canvas_url", "https://canvas.illinois.edu", "https://canvas.illinois.edu")]
#[case("vault_path", "/srv/notes", "/srv/notes")]
#[case("sync_time", "18:30", "18:30")]
#[case("sync_time", "6:00", "06:00")]
#[case("sync_files", "yes", "true")]
#[case("generate_todo", "off", "false")]
fn set_then_get_normalizes(#[case] key: &str, #[case] input: &str, #[case] expected: &str) {
    let mut s = Settings::default();
    s.set(key, input)
        .unwrap_or_else(|e| panic!("[{key}] set failed: {e}"));
    assert_eq!(s.get(key).expect("get"), expected, "[{key}]");
}

#[rstest]
#[case("sync_time", "noon")]
#[case("sync_files", "maybe")]
#[case("vault_path", "   ")]
#[case("canvas_url", "ftp://canvas")]
fn invalid_values_are_rejected(#[case] key: &str, #[case] input: &str) {
    let mut s = Settings::default();
    let err = s.set(key, input).expect_err("should reject");
    assert!(matches!(err, ConfigError::InvalidValue { .. }), "[{key}] {err}");
}

#[test]
fn every_documented_key_is_readable() {
    let s = Settings::default();
    for key in SETTING_KEYS {
        s.get(key)
            .unwrap_or_else(|e| panic!("documented key {key} unreadable: {e}"));
    }
}

#[test]
fn selection_persists_across_save() {
    let home = TempDir::new().expect("home");
    let mut s = settings::load_at(home.path()).expect("load defaults");
    s.set_selected_courses(vec![
        (CourseId::from("65270"), "STAT 410".to_string()),
        (CourseId::from("64369"), "SPED 117".to_string()),
    ]);
    settings::save_at(home.path(), &s).expect("save");

    let mut reloaded = settings::load_at(home.path()).expect("reload");
    assert_eq!(reloaded.selected_courses.len(), 2);

    reloaded.set_selected_courses(vec![(CourseId::from("1"), "CS 225".to_string())]);
    settings::save_at(home.path(), &reloaded).expect("save again");
    let last = settings::load_at(home.path()).expect("reload again");
    let ids: Vec<_> = last.selected_courses.iter().map(|c| c.course_id.0.as_str()).collect();
    assert_eq!(ids, vec!["1"]);
}

#[test]
fn older_file_without_optional_sections_loads() {
    let home = TempDir::new().expect("home");
    let dir = settings::config_dir_at(home.path());
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(
        settings::settings_path_at(home.path()),
        "version: 1\ncanvas_url: https://canvas.example.edu\nsync_time: '05:45'\n",
    )
    .expect("write");

    let s = settings::load_at(home.path()).expect("load");
    assert!(s.selected_courses.is_empty());
    assert!(s.scrape_sources.is_empty());
    assert!(s.generate_todo, "generate_todo defaults to true");
    assert!(!s.sync_files);
    assert_eq!(s.sync_time().expect("time").to_string(), "05:45:00");
}
