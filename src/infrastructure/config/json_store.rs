//! JSON settings store adapter

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::debug;

use crate::application::ports::{LoadNote, LoadedSettings, SettingsStore};
use crate::domain::config::{RecorderConfig, CONFIG_KEYS};
use crate::domain::error::ConfigError;

pub const APP_DIR: &str = "screen-audio-recorder";
pub const SETTINGS_FILE: &str = "settings.json";

/// Settings stored as a flat JSON document under the XDG config dir
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// `$XDG_CONFIG_HOME/screen-audio-recorder/settings.json`
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR);

        Self {
            path: config_dir.join(SETTINGS_FILE),
        }
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Apply each known key on its own so one bad value keeps the others.
    fn parse_lenient(content: &str) -> LoadedSettings {
        let document: Map<String, Value> = match serde_json::from_str(content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return LoadedSettings::unreadable("Settings file is not a JSON object, using defaults"),
            Err(e) => {
                return LoadedSettings::unreadable(format!(
                    "Failed to parse settings file, using defaults: {}",
                    e
                ))
            }
        };

        let mut merged = match serde_json::to_value(RecorderConfig::default()) {
            Ok(Value::Object(map)) => map,
            _ => return LoadedSettings::defaults(),
        };

        let mut notes = Vec::new();
        for (key, value) in document {
            if !CONFIG_KEYS.contains(&key.as_str()) {
                notes.push(LoadNote::Corrected {
                    message: format!("Ignoring unknown settings key '{}'", key),
                    key,
                });
                continue;
            }
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value);
            match serde_json::from_value::<RecorderConfig>(Value::Object(candidate.clone())) {
                Ok(_) => merged = candidate,
                Err(e) => notes.push(LoadNote::Corrected {
                    message: format!("Unreadable settings value, using default: {}", e),
                    key,
                }),
            }
        }

        let (config, corrections) = serde_json::from_value::<RecorderConfig>(Value::Object(merged))
            .unwrap_or_default()
            .validate();
        notes.extend(corrections.into_iter().map(LoadNote::from));
        LoadedSettings { config, notes }
    }

    fn to_json(config: &RecorderConfig) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    /// Write next to the target and rename over it
    fn write_atomic(path: &Path, content: &str) -> Result<(), ConfigError> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        let mut file = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        file.persist(path)
            .map_err(|e| ConfigError::WriteError(e.error.to_string()))?;
        Ok(())
    }
}

impl Default for JsonSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load_reported(&self) -> LoadedSettings {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Self::parse_lenient(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LoadedSettings::defaults(),
            Err(e) => LoadedSettings::unreadable(format!(
                "Failed to read {}, using defaults: {}",
                self.path.display(),
                e
            )),
        }
    }

    async fn save(&self, config: &RecorderConfig) -> Result<(), ConfigError> {
        let content = Self::to_json(config)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::write_atomic(&path, &content))
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))??;
        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.to_string_lossy().to_string(),
            ));
        }

        self.save(&RecorderConfig::default()).await
    }
}
