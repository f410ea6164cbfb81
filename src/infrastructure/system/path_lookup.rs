//! Executable lookup on `$PATH`

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::application::ports::ToolLocator;

/// Looks binaries up the way a shell would, without spawning `which`
#[derive(Debug, Default)]
pub struct PathLookup {
    search_path: Option<OsString>,
}

impl PathLookup {
    /// Search the process `$PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Search an explicit `PATH`-style list
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl ToolLocator for PathLookup {
    fn find(&self, binary: &str) -> Option<PathBuf> {
        let search_path = self.search_path.clone().or_else(|| env::var_os("PATH"))?;
        env::split_paths(&search_path)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.join(binary))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn finds_only_executable_files() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("ffmpeg");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        let plain = dir.path().join("pactl");
        fs::write(&plain, "").unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();

        let tools = PathLookup::with_search_path(dir.path().as_os_str());
        assert_eq!(tools.find("ffmpeg"), Some(tool));
        assert_eq!(tools.find("pactl"), None);
        assert_eq!(tools.find("missing"), None);
    }

    #[test]
    fn directories_are_not_executables() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("ffmpeg")).unwrap();
        let tools = PathLookup::with_search_path(dir.path().as_os_str());
        assert_eq!(tools.find("ffmpeg"), None);
    }
}
