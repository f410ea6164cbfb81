//! Error scenario integration tests

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const EXIT_USAGE_ERROR: i32 = 2;
const EXIT_DEPENDENCY_MISSING: i32 = 3;

/// Binary with settings, logs and PATH confined to `home`
fn isolated(home: &Path, path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("screen-audio-recorder").expect("binary builds");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("PATH", path)
        .env_remove("RUST_LOG");
    cmd
}

#[cfg(unix)]
fn fake_tool(dir: &Path, name: &str) {
    use std::os::unix::fs::PermissionsExt;
    let tool = dir.join(name);
    std::fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn missing_ffmpeg_exits_with_dependency_code() {
    let home = TempDir::new().unwrap();
    let empty_path = TempDir::new().unwrap();

    isolated(home.path(), empty_path.path())
        .args(["--no-audio", "-o"])
        .arg(home.path().join("videos"))
        .assert()
        .code(EXIT_DEPENDENCY_MISSING)
        .stderr(predicate::str::contains("ffmpeg"))
        .stderr(predicate::str::contains("apt install ffmpeg"));
}

#[cfg(unix)]
#[test]
fn missing_pactl_is_reported_before_recording() {
    let home = TempDir::new().unwrap();
    let bin = TempDir::new().unwrap();
    fake_tool(bin.path(), "ffmpeg");

    isolated(home.path(), bin.path())
        .args(["--apps", "Firefox", "-o"])
        .arg(home.path().join("videos"))
        .assert()
        .code(EXIT_DEPENDENCY_MISSING)
        .stderr(predicate::str::contains("pactl"))
        .stderr(predicate::str::contains("pulseaudio-utils"));

    // nothing was recorded
    let videos = home.path().join("videos");
    let recorded = std::fs::read_dir(&videos)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(recorded, 0);
}

#[test]
fn apps_without_pactl() {
    let home = TempDir::new().unwrap();
    let empty_path = TempDir::new().unwrap();

    isolated(home.path(), empty_path.path())
        .arg("apps")
        .assert()
        .code(EXIT_DEPENDENCY_MISSING)
        .stderr(predicate::str::contains("pactl"));
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    isolated(home.path(), home.path())
        .args(["config", "get", "unknown_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_unknown_key() {
    let home = TempDir::new().unwrap();
    isolated(home.path(), home.path())
        .args(["config", "set", "api_key", "value"])
        .assert()
        .code(EXIT_USAGE_ERROR)
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn config_set_out_of_range_values() {
    let home = TempDir::new().unwrap();
    for (key, value, message) in [
        ("frameRate", "0", "Frame rate"),
        ("frameRate", "fast", "number"),
        ("quality", "101", "between 1 and 100"),
        ("audioSampleRate", "12345", "Sample rate"),
        ("audioChannels", "6", "mono"),
        ("audioDelayMs", "5000", "-1000 and 1000"),
        ("videoCodec", "theora", "XVID"),
        ("outputFormat", "flv", "mp4"),
        ("debugMode", "maybe", "true"),
        ("logLevel", "verbose", "debug"),
    ] {
        isolated(home.path(), home.path())
            .args(["config", "set", key, value])
            .assert()
            .code(EXIT_USAGE_ERROR)
            .stderr(predicate::str::contains(message));
    }

    // rejected values never create the file
    assert!(!home.path().join("config/screen-audio-recorder/settings.json").exists());
}

#[test]
fn invalid_fps_override() {
    let home = TempDir::new().unwrap();
    isolated(home.path(), home.path())
        .args(["--fps", "500"])
        .assert()
        .code(EXIT_USAGE_ERROR)
        .stderr(predicate::str::contains("Frame rate"));
}

#[test]
fn config_list_with_no_file() {
    let home = TempDir::new().unwrap();
    isolated(home.path(), home.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("outputFormat"))
        .stdout(predicate::str::contains("mp4"));
}

fn write_settings(home: &Path, content: &str) {
    let dir = home.join("config/screen-audio-recorder");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("settings.json"), content).unwrap();
}

fn read_log(home: &Path) -> String {
    std::fs::read_to_string(home.join("data/screen-audio-recorder/recorder.log")).unwrap_or_default()
}

#[test]
fn corrupt_settings_are_logged() {
    let home = TempDir::new().unwrap();
    let empty_path = TempDir::new().unwrap();
    write_settings(home.path(), "{ not json");

    isolated(home.path(), empty_path.path())
        .arg("apps")
        .assert()
        .code(EXIT_DEPENDENCY_MISSING);

    let log = read_log(home.path());
    assert!(log.contains("Failed to parse settings file"), "log was: {}", log);
}

#[test]
fn corrected_settings_are_logged_at_debug_level() {
    let home = TempDir::new().unwrap();
    let empty_path = TempDir::new().unwrap();
    write_settings(home.path(), r#"{"debugMode": true, "quality": 500}"#);

    isolated(home.path(), empty_path.path())
        .arg("apps")
        .assert()
        .code(EXIT_DEPENDENCY_MISSING);

    let log = read_log(home.path());
    assert!(log.contains("DEBUG"), "log was: {}", log);
    assert!(log.contains("quality 500 outside 1..=100"), "log was: {}", log);
}
