//! Layered configuration loading

use std::fs;
use std::path::Path;

use config::Map;
use rstest::rstest;
use tempfile::TempDir;

use twig::{Settings, TreeArena, TreeError};

fn env(vars: &[(&str, &str)]) -> Option<Map<String, String>> {
    Some(
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================
// layering
// ============================================================

#[rstest]
fn given_no_sources_when_loading_then_defaults_apply() {
    let settings = Settings::load_from(None, None, env(&[])).unwrap();

    assert_eq!(settings, Settings::default());
}

#[rstest]
fn given_config_file_when_loading_then_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "twig.toml", "label_key = \"title\"\n");

    let settings = Settings::load_from(None, Some(path.as_path()), env(&[])).unwrap();

    assert_eq!(settings.label_key, "title");
    assert_eq!(settings.initial_capacity, Settings::default().initial_capacity);
}

#[rstest]
fn given_global_and_local_files_when_loading_then_local_wins() {
    let dir = TempDir::new().unwrap();
    let global = write_config(
        &dir,
        "global.toml",
        "label_key = \"global\"\ninitial_capacity = 16\n",
    );
    let local = write_config(&dir, "local.toml", "label_key = \"local\"\n");

    let settings =
        Settings::load_from(Some(global.as_path()), Some(local.as_path()), env(&[])).unwrap();

    assert_eq!(settings.label_key, "local");
    assert_eq!(settings.initial_capacity, 16);
}

#[rstest]
fn given_missing_config_file_when_loading_then_defaults_apply() {
    let dir = TempDir::new().unwrap();
    let absent = dir.path().join("absent.toml");

    let settings = Settings::load_from(
        Some(Path::new("/nonexistent/twig.toml")),
        Some(absent.as_path()),
        env(&[]),
    )
    .unwrap();

    assert_eq!(settings, Settings::default());
}

#[rstest]
fn given_malformed_config_file_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "twig.toml", "label_key = [unterminated");

    let err = Settings::load_from(None, Some(path.as_path()), env(&[])).unwrap_err();

    assert!(matches!(err, TreeError::Config(_)));
}

#[rstest]
fn given_env_var_when_loading_then_env_wins_over_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "twig.toml", "initial_capacity = 8\n");

    let settings = Settings::load_from(
        None,
        Some(path.as_path()),
        env(&[("TWIG_INITIAL_CAPACITY", "512"), ("OTHER_LABEL_KEY", "ignored")]),
    )
    .unwrap();

    assert_eq!(settings.initial_capacity, 512);
    assert_eq!(settings.label_key, "name");
}

// ============================================================
// arena sizing
// ============================================================

#[rstest]
fn given_settings_when_creating_arena_then_starts_empty() {
    let settings = Settings {
        initial_capacity: 4,
        ..Settings::default()
    };

    let arena = TreeArena::with_settings(&settings);

    assert!(arena.is_empty());
}
