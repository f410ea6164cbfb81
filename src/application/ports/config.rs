//! Settings port interface

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::domain::config::{ConfigCorrection, RecorderConfig};
use crate::domain::error::ConfigError;

/// Something loading had to work around
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadNote {
    /// The whole document was unusable and defaults were used
    Unreadable(String),
    /// One value was ignored or replaced by its default
    Corrected { key: String, message: String },
}

impl LoadNote {
    /// Unusable documents at warn level, single values at debug level
    pub fn log(&self) {
        match self {
            Self::Unreadable(message) => warn!("{}", message),
            Self::Corrected { key, message } => debug!(key = %key, "{}", message),
        }
    }
}

impl From<ConfigCorrection> for LoadNote {
    fn from(correction: ConfigCorrection) -> Self {
        Self::Corrected {
            key: correction.key.to_string(),
            message: correction.message,
        }
    }
}

/// Settings plus the notes gathered while loading them
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    pub config: RecorderConfig,
    pub notes: Vec<LoadNote>,
}

impl LoadedSettings {
    pub fn defaults() -> Self {
        Self {
            config: RecorderConfig::default(),
            notes: Vec::new(),
        }
    }

    pub fn unreadable(message: impl Into<String>) -> Self {
        Self {
            config: RecorderConfig::default(),
            notes: vec![LoadNote::Unreadable(message.into())],
        }
    }
}

/// Port for settings storage
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load settings without logging anything.
    ///
    /// Never fails: a missing or unreadable document yields defaults, and
    /// bad individual values are replaced by their defaults. Each fix is
    /// reported in `notes` so it can be logged once logging is up.
    async fn load_reported(&self) -> LoadedSettings;

    /// Load settings and log what had to be fixed.
    async fn load(&self) -> RecorderConfig {
        let loaded = self.load_reported().await;
        for note in &loaded.notes {
            note.log();
        }
        loaded.config
    }

    /// Save settings atomically.
    async fn save(&self, config: &RecorderConfig) -> Result<(), ConfigError>;

    /// Get the settings file path.
    fn path(&self) -> PathBuf;

    /// Check if the settings file exists.
    fn exists(&self) -> bool;

    /// Write a settings file with defaults.
    /// Fails if the file already exists.
    async fn init(&self) -> Result<(), ConfigError>;

    /// Overwrite the settings file with defaults.
    async fn reset(&self) -> Result<(), ConfigError> {
        self.save(&RecorderConfig::default()).await
    }
}
