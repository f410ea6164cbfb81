//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::{AudioFallback, StartOptions};
use crate::domain::recording::Duration;

/// Screen Audio Recorder - record the screen together with selected applications' audio
#[derive(Parser, Debug)]
#[command(name = "screen-audio-recorder")]
#[command(version)]
#[command(about = "Record the screen with audio from selected applications (PulseAudio/PipeWire + FFmpeg)")]
#[command(long_about = None)]
pub struct Cli {
    /// Stop automatically after this long (e.g., 30s, 5m, 1h30m)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Capture frame rate (overrides settings)
    #[arg(short = 'f', long, value_name = "FPS")]
    pub fps: Option<f64>,

    /// Applications whose audio is recorded, comma separated (overrides settings)
    #[arg(short = 'a', long, value_name = "APPS", value_delimiter = ',', conflicts_with = "no_audio")]
    pub apps: Option<Vec<String>>,

    /// Record video only
    #[arg(long)]
    pub no_audio: bool,

    /// Keep recording video if audio routing cannot be set up
    #[arg(long)]
    pub allow_video_only: bool,

    /// Monitor to record, 0 for all of them (overrides settings, see `screens`)
    #[arg(short = 's', long, value_name = "N")]
    pub screen: Option<u32>,

    /// Directory for finished recordings (overrides settings)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Verbose logging to the log file
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Session options derived from the flags
    pub fn start_options(&self) -> StartOptions {
        StartOptions {
            record_audio: !self.no_audio,
            audio_fallback: if self.allow_video_only {
                AudioFallback::VideoOnly
            } else {
                AudioFallback::Abort
            },
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List applications currently playing audio
    Apps,
    /// List monitors that can be recorded
    Screens,
    /// Manage settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Create settings file with defaults
    Init,
    /// Set a setting
    Set {
        /// Setting key (e.g., frameRate)
        key: String,
        /// New value
        value: String,
    },
    /// Get a setting
    Get {
        /// Setting key
        key: String,
    },
    /// List all settings
    List,
    /// Show settings file path
    Path,
    /// Restore default settings
    Reset,
}

/// Parsed recording options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub duration: Option<Duration>,
    pub start: StartOptions,
    pub notify: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["screen-audio-recorder"]);
        assert!(cli.duration.is_none());
        assert!(cli.fps.is_none());
        assert!(cli.apps.is_none());
        assert!(cli.screen.is_none());
        assert!(!cli.no_audio);
        assert!(!cli.notify);
        assert!(cli.command.is_none());

        let options = cli.start_options();
        assert!(options.record_audio);
        assert_eq!(options.audio_fallback, AudioFallback::Abort);
    }

    #[test]
    fn cli_parses_app_list() {
        let cli = Cli::parse_from(["screen-audio-recorder", "--apps", "Firefox,mpv"]);
        assert_eq!(cli.apps, Some(vec!["Firefox".to_string(), "mpv".to_string()]));
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::parse_from([
            "screen-audio-recorder",
            "-d",
            "1m30s",
            "--fps",
            "30",
            "-o",
            "/tmp/rec",
            "--allow-video-only",
        ]);
        assert_eq!(cli.duration.as_deref(), Some("1m30s"));
        assert_eq!(cli.fps, Some(30.0));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/rec")));
        assert_eq!(cli.start_options().audio_fallback, AudioFallback::VideoOnly);
    }

    #[test]
    fn no_audio_conflicts_with_apps() {
        let result = Cli::try_parse_from(["screen-audio-recorder", "--no-audio", "--apps", "mpv"]);
        assert!(result.is_err());
    }

    #[test]
    fn no_audio_disables_audio() {
        let cli = Cli::parse_from(["screen-audio-recorder", "--no-audio"]);
        assert!(!cli.start_options().record_audio);
    }

    #[test]
    fn cli_parses_apps_subcommand() {
        let cli = Cli::parse_from(["screen-audio-recorder", "apps"]);
        assert!(matches!(cli.command, Some(Commands::Apps)));
    }

    #[test]
    fn cli_parses_screen_selection() {
        let cli = Cli::parse_from(["screen-audio-recorder", "-s", "2"]);
        assert_eq!(cli.screen, Some(2));

        let cli = Cli::parse_from(["screen-audio-recorder", "screens"]);
        assert!(matches!(cli.command, Some(Commands::Screens)));

        assert!(Cli::try_parse_from(["screen-audio-recorder", "--screen", "-1"]).is_err());
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["screen-audio-recorder", "config", "set", "frameRate", "30"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "frameRate");
            assert_eq!(value, "30");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn cli_parses_config_reset() {
        let cli = Cli::parse_from(["screen-audio-recorder", "config", "reset"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Reset
            })
        ));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
