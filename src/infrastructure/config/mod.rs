//! Settings persistence

mod json_store;

pub use json_store::{JsonSettingsStore, APP_DIR, SETTINGS_FILE};
