//! External tool lookup port

use std::path::PathBuf;

/// Port for locating external executables
pub trait ToolLocator: Send + Sync {
    /// Full path of `binary` if it can be executed
    fn find(&self, binary: &str) -> Option<PathBuf>;
}
