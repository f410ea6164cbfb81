//! Recording and listing runners

use std::process::ExitCode;
use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::application::dependencies::PACTL;
use crate::application::ports::{CaptureBackend, ToolLocator, NotificationIcon, Notifier};
use crate::application::{AudioRouter, Recorder, RecorderDeps, RecorderError};
use crate::domain::config::RecorderConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::ALL_SCREENS;
use crate::infrastructure::notification::create_notifier;
use crate::infrastructure::{
    FfmpegAudioCapture, FfmpegMuxer, PactlAudioServer, PathLookup, ScreenCaptureBackend,
};

use super::args::{Cli, RecordOptions};
use super::presenter::Presenter;
use super::signals::{ControlHandler, ControlSignal};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_DEPENDENCY_MISSING: u8 = 3;

/// Status line refresh
const STATUS_INTERVAL: std::time::Duration = std::time::Duration::from_millis(200);

/// Production adapters
pub fn default_deps() -> RecorderDeps {
    RecorderDeps {
        audio_server: Arc::new(PactlAudioServer::new()),
        audio_capture: Arc::new(FfmpegAudioCapture::new()),
        capture: Arc::new(ScreenCaptureBackend::new()),
        muxer: Arc::new(FfmpegMuxer::new()),
        tools: Arc::new(PathLookup::new()),
    }
}

/// Apply command-line overrides on top of the stored settings.
///
/// Overrides go through the same checks as `config set`.
pub fn apply_overrides(config: &mut RecorderConfig, cli: &Cli) -> Result<(), ConfigError> {
    if let Some(fps) = cli.fps {
        config.set("frameRate", &fps.to_string())?;
    }
    if let Some(apps) = &cli.apps {
        config.set("selectedApps", &apps.join(","))?;
    }
    if let Some(screen) = cli.screen {
        config.set("screenIndex", &screen.to_string())?;
    }
    if let Some(dir) = &cli.output_dir {
        config.set("outputDirectory", &dir.to_string_lossy())?;
    }
    if cli.debug {
        config.debug_mode = true;
    }
    Ok(())
}

fn exit_code_for(error: &RecorderError) -> u8 {
    match error {
        RecorderError::DependencyMissing { .. } => EXIT_DEPENDENCY_MISSING,
        _ => EXIT_ERROR,
    }
}

async fn notify(notifier: Option<&dyn Notifier>, title: &str, message: &str, icon: NotificationIcon) {
    if let Some(notifier) = notifier {
        if let Err(e) = notifier.notify(title, message, icon).await {
            warn!("Notification failed: {}", e);
        }
    }
}

/// Record until the user stops, the duration elapses or capture fails
pub async fn run_recording(config: RecorderConfig, options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();
    let notifier = options.notify.then(create_notifier);
    let notifier = notifier.as_deref();

    let mut controls = match ControlHandler::new() {
        Ok(controls) => controls,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let recorder = Recorder::new(default_deps());
    let mut session = match recorder.start(&config, options.start.clone()).await {
        Ok(session) => session,
        Err(e) => {
            presenter.error_with_remedy(&e.to_string(), e.remedy());
            notify(notifier, "Recording failed", &e.to_string(), NotificationIcon::Error).await;
            return ExitCode::from(exit_code_for(&e));
        }
    };

    let output = session.paths().output.clone();
    presenter.info(&format!("Recording to {}", output.display()));
    if session.has_audio() {
        let routes = session.routes().await;
        if routes.is_empty() {
            presenter.warn("None of the selected applications is playing audio; the audio track will be silent");
        } else {
            let apps: Vec<&str> = routes.iter().map(|r| r.app_name.as_str()).collect();
            presenter.info(&format!("Recording audio from: {}", apps.join(", ")));
        }
    } else {
        presenter.info("Recording video only");
    }
    notify(notifier, "Recording started", &output.to_string_lossy(), NotificationIcon::Recording).await;

    presenter.start_spinner("Recording...");
    let mut ticker = interval(STATUS_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let cancelled = loop {
        tokio::select! {
            control = controls.recv() => match control {
                Some(ControlSignal::TogglePause) => {
                    if let Err(e) = session.toggle_pause().await {
                        warn!("Cannot toggle pause: {}", e);
                    }
                }
                Some(ControlSignal::Cancel) => break true,
                Some(ControlSignal::Stop) | None => break false,
            },
            _ = ticker.tick() => {
                if session.capture_failed() {
                    warn!("Screen capture stopped unexpectedly");
                    break false;
                }
                let elapsed = session.elapsed();
                if options.duration.is_some_and(|limit| elapsed >= limit) {
                    info!("Duration limit reached");
                    break false;
                }
                presenter.update_recording_status(session.state(), elapsed, options.duration, session.stats());
            }
        }
    };

    if cancelled {
        presenter.update_spinner("Discarding recording...");
        return match session.cancel().await {
            Ok(()) => {
                presenter.spinner_fail("Recording cancelled, nothing was saved");
                notify(notifier, "Recording cancelled", "Nothing was saved", NotificationIcon::Warning).await;
                // no file was produced
                ExitCode::from(EXIT_ERROR)
            }
            Err(e) => {
                presenter.spinner_fail("Cancel failed");
                presenter.error(&e.to_string());
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    presenter.update_spinner("Saving recording...");
    match session.stop().await {
        Ok(outcome) => {
            presenter.spinner_success(&format!(
                "Saved {} ({}, {}, {} frames)",
                outcome.output.display(),
                outcome.duration.format_clock(),
                outcome.human_size(),
                outcome.stats.frames_captured
            ));
            if outcome.stats.frames_dropped > 0 {
                presenter.warn(&format!(
                    "{} frames were dropped ({:.1}%); try a lower frame rate",
                    outcome.stats.frames_dropped,
                    outcome.stats.drop_rate() * 100.0
                ));
            }
            presenter.output(&outcome.output.to_string_lossy());
            notify(notifier, "Recording saved", &outcome.output.to_string_lossy(), NotificationIcon::Success).await;
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail("Recording failed");
            presenter.error_with_remedy(&e.to_string(), e.remedy());
            if let RecorderError::Encoding { partial_files, .. } = &e {
                for file in partial_files {
                    presenter.info(&format!("Kept {}", file.display()));
                }
            }
            notify(notifier, "Recording failed", &e.to_string(), NotificationIcon::Error).await;
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Print the streams that could be recorded
pub async fn run_list_apps(config: &RecorderConfig) -> ExitCode {
    let presenter = Presenter::new();
    let (binary, remedy) = PACTL;
    if PathLookup::new().find(binary).is_none() {
        presenter.error_with_remedy(&format!("{} is not installed", binary), Some(remedy));
        return ExitCode::from(EXIT_DEPENDENCY_MISSING);
    }

    let router = AudioRouter::new(
        Arc::new(PactlAudioServer::new()),
        config.audio_sample_rate,
        config.audio_channels,
    );
    let streams = match router.list_candidate_streams().await {
        Ok(streams) => streams,
        Err(e) => {
            presenter.error_with_remedy(
                &format!("Cannot list audio streams: {}", e),
                Some("Make sure PulseAudio (or pipewire-pulse) is running"),
            );
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if streams.is_empty() {
        presenter.info("No application is playing audio");
        return ExitCode::from(EXIT_SUCCESS);
    }

    for stream in streams {
        let selected = config.selected_apps.iter().any(|app| stream.matches_app(app));
        let marker = if selected { "*" } else { " " };
        presenter.output(&format!("{} #{:<5} {}", marker, stream.id.to_string(), stream.app_name));
    }
    presenter.info("* = selected for recording (config set selectedApps ...)");
    ExitCode::from(EXIT_SUCCESS)
}

/// Print the monitors `--screen` can pick from
pub fn run_list_screens(config: &RecorderConfig) -> ExitCode {
    let presenter = Presenter::new();
    let monitors = match ScreenCaptureBackend::new().list_monitors() {
        Ok(monitors) => monitors,
        Err(e) => {
            presenter.error_with_remedy(
                &e.to_string(),
                Some("Screen capture needs an X11 session; check that DISPLAY is set"),
            );
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let all = if config.screen_index == ALL_SCREENS { "*" } else { " " };
    presenter.output(&format!("{} Screen 0: all monitors", all));
    for monitor in monitors {
        let marker = if monitor.index == config.screen_index { "*" } else { " " };
        presenter.output(&format!("{} {}", marker, monitor));
    }
    presenter.info("* = selected for recording (config set screenIndex ... or --screen)");
    ExitCode::from(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn overrides_replace_stored_settings() {
        let cli = Cli::parse_from([
            "screen-audio-recorder",
            "--fps",
            "30",
            "--apps",
            "mpv, Firefox",
            "--screen",
            "2",
            "-o",
            "/tmp/rec",
            "--debug",
        ]);
        let mut config = RecorderConfig::default();
        apply_overrides(&mut config, &cli).unwrap();

        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.selected_apps, vec!["mpv".to_string(), "Firefox".to_string()]);
        assert_eq!(config.screen_index, 2);
        assert_eq!(config.output_directory, PathBuf::from("/tmp/rec"));
        assert_eq!(config.effective_log_level(), "debug");
    }

    #[test]
    fn invalid_fps_override_is_rejected() {
        let cli = Cli::parse_from(["screen-audio-recorder", "--fps", "500"]);
        let mut config = RecorderConfig::default();
        assert!(apply_overrides(&mut config, &cli).is_err());
    }

    #[test]
    fn missing_dependency_has_its_own_exit_code() {
        let err = RecorderError::DependencyMissing {
            binary: "ffmpeg",
            remedy: "install it",
        };
        assert_eq!(exit_code_for(&err), EXIT_DEPENDENCY_MISSING);
        assert_eq!(exit_code_for(&RecorderError::AlreadyRecording), EXIT_ERROR);
    }
}
