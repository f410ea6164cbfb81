//! Startup check for external tools

use thiserror::Error;
use tracing::debug;

use super::ports::ToolLocator;

/// A required external tool that could not be found
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{binary} not found on PATH")]
pub struct MissingDependency {
    pub binary: &'static str,
    pub remedy: &'static str,
}

/// Tools the recorder shells out to, with install hints
pub const FFMPEG: (&str, &str) = ("ffmpeg", "Install ffmpeg (e.g. `sudo apt install ffmpeg`)");
pub const PACTL: (&str, &str) = (
    "pactl",
    "Install pulseaudio-utils (e.g. `sudo apt install pulseaudio-utils`)",
);

/// Check every tool the session will need, in a fixed order.
///
/// `pactl` is only required when audio is recorded.
pub fn check_dependencies(
    tools: &dyn ToolLocator,
    need_audio: bool,
) -> Result<(), MissingDependency> {
    let mut required = vec![FFMPEG];
    if need_audio {
        required.push(PACTL);
    }

    for (binary, remedy) in required {
        match tools.find(binary) {
            Some(path) => debug!("Found {} at {}", binary, path.display()),
            None => return Err(MissingDependency { binary, remedy }),
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Locator that knows a fixed set of binaries
    pub(crate) struct FakeTools(pub Vec<&'static str>);

    impl ToolLocator for FakeTools {
        fn find(&self, binary: &str) -> Option<PathBuf> {
            self.0
                .contains(&binary)
                .then(|| PathBuf::from("/usr/bin").join(binary))
        }
    }

    #[test]
    fn all_present() {
        let tools = FakeTools(vec!["ffmpeg", "pactl"]);
        assert!(check_dependencies(&tools, true).is_ok());
    }

    #[test]
    fn missing_pactl_reported_with_remedy() {
        let tools = FakeTools(vec!["ffmpeg"]);
        let err = check_dependencies(&tools, true).unwrap_err();
        assert_eq!(err.binary, "pactl");
        assert!(err.remedy.contains("pulseaudio-utils"));
    }

    #[test]
    fn pactl_not_needed_without_audio() {
        let tools = FakeTools(vec!["ffmpeg"]);
        assert!(check_dependencies(&tools, false).is_ok());
    }

    #[test]
    fn ffmpeg_always_required() {
        let tools = FakeTools(vec!["pactl"]);
        let err = check_dependencies(&tools, false).unwrap_err();
        assert_eq!(err.binary, "ffmpeg");
    }
}
