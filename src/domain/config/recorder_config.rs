//! Recorder configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::codec::{OutputFormat, VideoCodec};
use crate::domain::error::ConfigError;

pub const DEFAULT_FRAME_RATE: f64 = 20.0;
pub const MAX_FRAME_RATE: f64 = 120.0;
pub const DEFAULT_QUALITY: u32 = 95;
/// First monitor; 0 records all of them
pub const DEFAULT_SCREEN_INDEX: u32 = 1;
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
pub const SUPPORTED_SAMPLE_RATES: [u32; 4] = [22_050, 44_100, 48_000, 96_000];
pub const DEFAULT_CHANNELS: u16 = 2;
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
pub const DEFAULT_AUDIO_DELAY_MS: i32 = -250;
pub const MAX_AUDIO_DELAY_MS: i32 = 1000;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
pub const DEFAULT_APPS: [&str; 6] = ["Firefox", "Chrome", "Chromium", "zoom", "Spotify", "discord"];

/// Settings keys, in the order `config list` prints them
pub const CONFIG_KEYS: &[&str] = &[
    "videoCodec",
    "frameRate",
    "quality",
    "screenIndex",
    "outputFormat",
    "audioSampleRate",
    "audioChannels",
    "audioBitrate",
    "audioDelayMs",
    "outputDirectory",
    "selectedApps",
    "autoIncrementFilename",
    "debugMode",
    "logLevel",
];

/// A value that `validate` replaced with its default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCorrection {
    pub key: &'static str,
    pub message: String,
}

/// Recorder configuration.
///
/// Persisted as a flat JSON document with camelCase keys. Missing keys take
/// their defaults; out-of-range values are replaced by `validated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    pub video_codec: VideoCodec,
    pub frame_rate: f64,
    pub quality: u32,
    /// Monitor to record, numbered from 1. 0 records every monitor.
    pub screen_index: u32,
    pub output_format: OutputFormat,
    pub audio_sample_rate: u32,
    pub audio_channels: u16,
    pub audio_bitrate: String,
    /// Audio/video offset applied when merging. Positive delays the audio.
    pub audio_delay_ms: i32,
    pub output_directory: PathBuf,
    pub selected_apps: Vec<String>,
    pub auto_increment_filename: bool,
    pub debug_mode: bool,
    pub log_level: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            video_codec: VideoCodec::default(),
            frame_rate: DEFAULT_FRAME_RATE,
            quality: DEFAULT_QUALITY,
            screen_index: DEFAULT_SCREEN_INDEX,
            output_format: OutputFormat::default(),
            audio_sample_rate: DEFAULT_SAMPLE_RATE,
            audio_channels: DEFAULT_CHANNELS,
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            audio_delay_ms: DEFAULT_AUDIO_DELAY_MS,
            output_directory: default_output_directory(),
            selected_apps: DEFAULT_APPS.iter().map(|s| s.to_string()).collect(),
            auto_increment_filename: true,
            debug_mode: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// `~/Videos/ScreenRecorder`, falling back to the working directory
pub fn default_output_directory() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .map(|videos| videos.join("ScreenRecorder"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl RecorderConfig {
    /// Replace every out-of-range field with its default. Never fails.
    pub fn validated(self) -> Self {
        let (config, corrections) = self.validate();
        for correction in &corrections {
            debug!(key = correction.key, "{}", correction.message);
        }
        config
    }

    /// Validate and report which fields were replaced.
    pub fn validate(mut self) -> (Self, Vec<ConfigCorrection>) {
        let defaults = Self::default();
        let mut corrections = Vec::new();
        let mut correct = |key: &'static str, message: String| {
            corrections.push(ConfigCorrection { key, message });
        };

        if !is_valid_frame_rate(self.frame_rate) {
            correct(
                "frameRate",
                format!("frame rate {} outside (0, {}], using {}", self.frame_rate, MAX_FRAME_RATE, defaults.frame_rate),
            );
            self.frame_rate = defaults.frame_rate;
        }

        if !(1..=100).contains(&self.quality) {
            correct(
                "quality",
                format!("quality {} outside 1..=100, using {}", self.quality, defaults.quality),
            );
            self.quality = defaults.quality;
        }

        if !SUPPORTED_SAMPLE_RATES.contains(&self.audio_sample_rate) {
            correct(
                "audioSampleRate",
                format!("unsupported sample rate {}, using {}", self.audio_sample_rate, defaults.audio_sample_rate),
            );
            self.audio_sample_rate = defaults.audio_sample_rate;
        }

        if !matches!(self.audio_channels, 1 | 2) {
            correct(
                "audioChannels",
                format!("unsupported channel count {}, using {}", self.audio_channels, defaults.audio_channels),
            );
            self.audio_channels = defaults.audio_channels;
        }

        if !is_valid_bitrate(&self.audio_bitrate) {
            correct(
                "audioBitrate",
                format!("invalid bitrate '{}', using {}", self.audio_bitrate, defaults.audio_bitrate),
            );
            self.audio_bitrate = defaults.audio_bitrate.clone();
        }

        if self.audio_delay_ms.abs() > MAX_AUDIO_DELAY_MS {
            correct(
                "audioDelayMs",
                format!("audio delay {}ms outside ±{}ms, using {}", self.audio_delay_ms, MAX_AUDIO_DELAY_MS, defaults.audio_delay_ms),
            );
            self.audio_delay_ms = defaults.audio_delay_ms;
        }

        if self.output_directory.as_os_str().is_empty() {
            correct("outputDirectory", "empty output directory, using default".to_string());
            self.output_directory = defaults.output_directory.clone();
        }

        let normalized = normalize_apps(&self.selected_apps);
        if normalized != self.selected_apps {
            correct("selectedApps", "removed blank or duplicate application names".to_string());
            self.selected_apps = normalized;
        }

        let level = self.log_level.trim().to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            correct(
                "logLevel",
                format!("unknown log level '{}', using {}", self.log_level, defaults.log_level),
            );
            self.log_level = defaults.log_level;
        } else {
            self.log_level = level;
        }

        (self, corrections)
    }

    /// Effective log filter level
    pub fn effective_log_level(&self) -> &str {
        if self.debug_mode {
            "debug"
        } else {
            &self.log_level
        }
    }

    pub fn wants_audio(&self) -> bool {
        !self.selected_apps.is_empty()
    }

    /// Read one setting as display text
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "videoCodec" => self.video_codec.to_string(),
            "frameRate" => self.frame_rate.to_string(),
            "quality" => self.quality.to_string(),
            "screenIndex" => self.screen_index.to_string(),
            "outputFormat" => self.output_format.to_string(),
            "audioSampleRate" => self.audio_sample_rate.to_string(),
            "audioChannels" => self.audio_channels.to_string(),
            "audioBitrate" => self.audio_bitrate.clone(),
            "audioDelayMs" => self.audio_delay_ms.to_string(),
            "outputDirectory" => self.output_directory.to_string_lossy().into_owned(),
            "selectedApps" => self.selected_apps.join(","),
            "autoIncrementFilename" => self.auto_increment_filename.to_string(),
            "debugMode" => self.debug_mode.to_string(),
            "logLevel" => self.log_level.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Set one setting from user text.
    ///
    /// Unlike loading, an invalid value here is an error rather than a silent
    /// correction, so the user sees what was wrong.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::ValidationError {
            key: key.to_string(),
            message,
        };
        let value = value.trim();

        match key {
            "videoCodec" => self.video_codec = value.parse().map_err(|e| invalid(format!("{}", e)))?,
            "outputFormat" => self.output_format = value.parse().map_err(|e| invalid(format!("{}", e)))?,
            "frameRate" => {
                let fps: f64 = value
                    .parse()
                    .map_err(|_| invalid("Value must be a number".to_string()))?;
                if !is_valid_frame_rate(fps) {
                    return Err(invalid(format!("Frame rate must be greater than 0 and at most {}", MAX_FRAME_RATE)));
                }
                self.frame_rate = fps;
            }
            "quality" => {
                let quality: u32 = value
                    .parse()
                    .map_err(|_| invalid("Value must be a whole number".to_string()))?;
                if !(1..=100).contains(&quality) {
                    return Err(invalid("Quality must be between 1 and 100".to_string()));
                }
                self.quality = quality;
            }
            "screenIndex" => {
                self.screen_index = value
                    .parse()
                    .map_err(|_| invalid("Screen index must be 0 (all screens) or a screen number from `screens`".to_string()))?;
            }
            "audioSampleRate" => {
                let rate: u32 = value
                    .parse()
                    .ok()
                    .filter(|rate| SUPPORTED_SAMPLE_RATES.contains(rate))
                    .ok_or_else(|| invalid("Sample rate must be 22050, 44100, 48000, or 96000".to_string()))?;
                self.audio_sample_rate = rate;
            }
            "audioChannels" => {
                self.audio_channels = match value {
                    "1" => 1,
                    "2" => 2,
                    _ => return Err(invalid("Channels must be 1 (mono) or 2 (stereo)".to_string())),
                };
            }
            "audioBitrate" => {
                if !is_valid_bitrate(value) {
                    return Err(invalid("Bitrate must look like 128k".to_string()));
                }
                self.audio_bitrate = value.to_string();
            }
            "audioDelayMs" => {
                let delay: i32 = value
                    .parse()
                    .ok()
                    .filter(|delay: &i32| delay.abs() <= MAX_AUDIO_DELAY_MS)
                    .ok_or_else(|| invalid("Audio delay must be between -1000 and 1000 milliseconds".to_string()))?;
                self.audio_delay_ms = delay;
            }
            "outputDirectory" => {
                if value.is_empty() {
                    return Err(invalid("Output directory cannot be empty".to_string()));
                }
                self.output_directory = PathBuf::from(value);
            }
            "selectedApps" => {
                let apps: Vec<String> = value.split(',').map(str::to_string).collect();
                self.selected_apps = normalize_apps(&apps);
            }
            "autoIncrementFilename" => self.auto_increment_filename = parse_bool(value).map_err(invalid)?,
            "debugMode" => self.debug_mode = parse_bool(value).map_err(invalid)?,
            "logLevel" => {
                let level = value.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(invalid(format!("Log level must be one of: {}", LOG_LEVELS.join(", "))));
                }
                self.log_level = level;
            }
            _ => {
                return Err(invalid(format!(
                    "Unknown key. Valid keys: {}",
                    CONFIG_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

fn is_valid_frame_rate(fps: f64) -> bool {
    fps.is_finite() && fps > 0.0 && fps <= MAX_FRAME_RATE
}

/// Bitrates look like `128k` or `192000`
fn is_valid_bitrate(value: &str) -> bool {
    let digits = value.strip_suffix(['k', 'K']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) && digits.parse::<u32>().map_or(false, |n| n > 0)
}

/// Trim names, drop blanks and case-insensitive duplicates, keep first spelling
fn normalize_apps(apps: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();
    for app in apps {
        let trimmed = app.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        result.push(trimmed.to_string());
    }
    result
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err("Value must be 'true' or 'false'".to_string()),
    }
}
