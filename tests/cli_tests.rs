//! CLI integration tests

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn recorder_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_screen-audio-recorder"))
}

/// Binary with config and data dirs redirected into `home`
fn isolated(home: &Path) -> Command {
    let mut cmd = recorder_bin();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_output() {
    let output = recorder_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Record the screen"));
    assert!(stdout.contains("--duration"));
    assert!(stdout.contains("--fps"));
    assert!(stdout.contains("--apps"));
    assert!(stdout.contains("--no-audio"));
    assert!(stdout.contains("--allow-video-only"));
    assert!(stdout.contains("--notify"));
    assert!(stdout.contains("--screen"));
    assert!(stdout.contains("screens"));
    assert!(stdout.contains("apps"));
    assert!(stdout.contains("config"));
}

#[test]
fn version_output() {
    let output = recorder_bin()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("screen-audio-recorder"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let home = TempDir::new().unwrap();
    let output = isolated(home.path())
        .args(["config", "path"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("screen-audio-recorder"));
    assert!(stdout.trim().ends_with("settings.json"));
    assert!(stdout.contains(&home.path().join("config").to_string_lossy().to_string()));
}

#[test]
fn config_help() {
    let output = recorder_bin()
        .args(["config", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for action in ["init", "set", "get", "list", "path", "reset"] {
        assert!(stdout.contains(action), "missing {}", action);
    }
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();

    let output = isolated(home.path())
        .args(["config", "set", "frameRate", "30"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let settings = home.path().join("config/screen-audio-recorder/settings.json");
    let content = std::fs::read_to_string(&settings).unwrap();
    assert!(content.contains("\"frameRate\": 30.0"));

    let output = isolated(home.path())
        .args(["config", "get", "frameRate"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "30");
}

#[test]
fn config_list_shows_defaults() {
    let home = TempDir::new().unwrap();
    let output = isolated(home.path())
        .args(["config", "list"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("videoCodec"));
    assert!(stdout.contains("XVID"));
    assert!(stdout.contains("frameRate"));
    assert!(stdout.contains("selectedApps"));
    assert!(stdout.contains("Firefox"));
    assert!(stdout.contains("screenIndex"));
}

#[test]
fn config_init_and_reset() {
    let home = TempDir::new().unwrap();

    let init = isolated(home.path())
        .args(["config", "init"])
        .output()
        .expect("Failed to execute command");
    assert!(init.status.success());

    let again = isolated(home.path())
        .args(["config", "init"])
        .output()
        .expect("Failed to execute command");
    assert_eq!(again.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&again.stderr).contains("already exists"));

    isolated(home.path())
        .args(["config", "set", "quality", "50"])
        .output()
        .expect("Failed to execute command");
    let reset = isolated(home.path())
        .args(["config", "reset"])
        .output()
        .expect("Failed to execute command");
    assert!(reset.status.success());

    let get = isolated(home.path())
        .args(["config", "get", "quality"])
        .output()
        .expect("Failed to execute command");
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "95");
}

#[test]
fn corrupt_settings_fall_back_to_defaults() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("config/screen-audio-recorder");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("settings.json"), r#"{"quality": -3, "outputFormat": "mkv"}"#).unwrap();

    let quality = isolated(home.path())
        .args(["config", "get", "quality"])
        .output()
        .expect("Failed to execute command");
    assert_eq!(String::from_utf8_lossy(&quality.stdout).trim(), "95");

    let format = isolated(home.path())
        .args(["config", "get", "outputFormat"])
        .output()
        .expect("Failed to execute command");
    assert_eq!(String::from_utf8_lossy(&format.stdout).trim(), "mkv");
}

#[test]
fn invalid_duration_error() {
    let home = TempDir::new().unwrap();
    let output = isolated(home.path())
        .args(["--duration", "invalid"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid duration"),
        "Expected error about invalid duration, got: {}",
        stderr
    );
}

#[test]
fn no_audio_conflicts_with_apps() {
    let output = recorder_bin()
        .args(["--no-audio", "--apps", "Firefox"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn screens_without_display() {
    let home = TempDir::new().unwrap();
    let output = isolated(home.path())
        .arg("screens")
        .env_remove("DISPLAY")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot open display"), "got: {}", stderr);
    assert!(stderr.contains("DISPLAY"));
}
