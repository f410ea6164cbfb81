//! CLI layer - Command-line interface
//!
//! Argument parsing, output formatting, recording controls, log setup
//! and the runners behind each command.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod logging;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{
    run_list_apps, run_list_screens, run_recording, EXIT_DEPENDENCY_MISSING, EXIT_ERROR, EXIT_SUCCESS,
    EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction, RecordOptions};
pub use presenter::Presenter;
