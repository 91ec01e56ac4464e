// tests/config_test.rs

use queueloader::config::{prepare_destination, Settings};
use queueloader::AppError;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Fresh scratch directory per test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "queueloader-test-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.destination, None);
    assert_eq!(settings.ytdlp_path, "yt-dlp");
    assert_eq!(settings.download_timeout(), None);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = scratch_dir("missing");
    let settings = Settings::load_from(&dir.join("settings.json")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_save_and_load() {
    let dir = scratch_dir("roundtrip");
    let path = dir.join("nested").join("settings.json");

    let settings = Settings {
        destination: Some(PathBuf::from("/tmp/videos")),
        ytdlp_path: "/usr/local/bin/yt-dlp".to_string(),
        download_timeout_secs: Some(600),
    };
    settings.save_to(&path).unwrap();
    assert!(path.exists());

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded, settings);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = scratch_dir("partial");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");
    fs::write(&path, r#"{ "destination": "/tmp/videos" }"#).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.destination, Some(PathBuf::from("/tmp/videos")));
    assert_eq!(loaded.ytdlp_path, "yt-dlp");
    assert_eq!(loaded.download_timeout_secs, None);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = scratch_dir("corrupt");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");
    fs::write(&path, "not json").unwrap();

    assert!(matches!(
        Settings::load_from(&path),
        Err(AppError::JsonError(_))
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_overrides() {
    let mut settings = Settings {
        destination: Some(PathBuf::from("/tmp/old")),
        ytdlp_path: "yt-dlp".to_string(),
        download_timeout_secs: Some(30),
    };

    settings.apply_overrides(None, None, None);
    assert_eq!(settings.destination, Some(PathBuf::from("/tmp/old")));
    assert_eq!(settings.download_timeout_secs, Some(30));

    settings.apply_overrides(Some("/tmp/new"), Some("/opt/yt-dlp"), Some(0));
    assert_eq!(settings.destination, Some(PathBuf::from("/tmp/new")));
    assert_eq!(settings.ytdlp_path, "/opt/yt-dlp");
    assert_eq!(settings.download_timeout_secs, Some(0));
}

#[test]
fn test_zero_timeout_disables_limit() {
    let mut settings = Settings::default();

    settings.download_timeout_secs = Some(0);
    assert_eq!(settings.download_timeout(), None);

    settings.download_timeout_secs = Some(90);
    assert_eq!(settings.download_timeout(), Some(Duration::from_secs(90)));
}

#[test]
fn test_prepare_destination_creates_folder() {
    let dir = scratch_dir("destination").join("a").join("b");
    assert!(!dir.exists());

    let prepared = prepare_destination(&dir).unwrap();
    assert_eq!(prepared, dir);
    assert!(dir.is_dir());

    // Existing folders are accepted as they are
    assert_eq!(prepare_destination(&dir).unwrap(), dir);

    let _ = fs::remove_dir_all(scratch_dir("destination"));
}

#[test]
fn test_prepare_destination_rejects_files() {
    let dir = scratch_dir("file-destination");
    fs::create_dir_all(&dir).unwrap();
    let file = dir.join("not-a-folder");
    fs::write(&file, "x").unwrap();

    assert!(matches!(
        prepare_destination(&file),
        Err(AppError::ConfigError(_))
    ));
    assert!(matches!(
        prepare_destination(std::path::Path::new("")),
        Err(AppError::ValidationError(_))
    ));

    let _ = fs::remove_dir_all(&dir);
}
