//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>h, <number>m, <number>s or a combination (e.g., 30s, 5m, 1h30m)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a settings value cannot be parsed into its typed form
#[derive(Debug, Clone, Error)]
#[error("Invalid {kind}: \"{input}\". Valid values are: {expected}")]
pub struct InvalidValueError {
    pub kind: &'static str,
    pub input: String,
    pub expected: &'static str,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    ReadError(String),

    #[error("Failed to parse settings file: {0}")]
    ParseError(String),

    #[error("Failed to write settings file: {0}")]
    WriteError(String),

    #[error("Invalid value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Settings file already exists at: {0}")]
    AlreadyExists(String),
}
