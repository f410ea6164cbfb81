//! Recording use case
//!
//! `Recorder::start` wires audio routing, the audio capture process and the
//! video capturer into a [`RecordingSession`]. The session owns all of them
//! until `stop` tears them down and merges the intermediates.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::audio::AudioRoute;
use crate::domain::config::RecorderConfig;
use crate::domain::recording::{
    incremental_filename, temp_sibling, timestamped_filename, Duration, FrameStats,
    RecordingOutcome,
};
use crate::domain::session::{InvalidStateTransition, SessionLifecycle, SessionState};

use super::audio_router::{AudioRouter, AudioRouterError};
use super::dependencies::check_dependencies;
use super::ports::{
    AudioCapture, AudioCaptureSpec, AudioServer, AudioServerError, CaptureBackend, CaptureError,
    ToolLocator, FrameSource, MergeRequest, Muxer, VideoWriterSpec,
};
use super::video_capturer::VideoCapturer;

/// Errors from the recording use case
#[derive(Debug, Clone, Error)]
pub enum RecorderError {
    #[error("{binary} is not installed")]
    DependencyMissing {
        binary: &'static str,
        remedy: &'static str,
    },

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("Audio setup failed: {0}")]
    AudioSetup(AudioServerError),

    #[error("{0}")]
    Routing(AudioRouterError),

    #[error("Screen capture failed: {0}")]
    Capture(CaptureError),

    #[error("Encoding failed: {message}")]
    Encoding {
        message: String,
        partial_files: Vec<PathBuf>,
    },

    #[error("Recording cancelled")]
    Cancelled,

    #[error("Cannot use output directory {path}: {message}")]
    OutputDirectory { path: PathBuf, message: String },

    #[error("{0}")]
    InvalidState(#[from] InvalidStateTransition),
}

impl RecorderError {
    /// What the user can do about it
    pub fn remedy(&self) -> Option<&'static str> {
        match self {
            Self::DependencyMissing { remedy, .. } => Some(*remedy),
            Self::AlreadyRecording => Some("Stop the current recording first"),
            Self::AudioSetup(_) => Some(
                "Make sure PulseAudio (or pipewire-pulse) is running, or record with --no-audio",
            ),
            Self::Capture(CaptureError::InvalidScreen(_)) => {
                Some("List monitors with `screen-audio-recorder screens` and pick one with --screen")
            }
            Self::Capture(_) => Some("Screen capture needs an X11 session; check that DISPLAY is set"),
            Self::Encoding { partial_files, .. } if !partial_files.is_empty() => {
                Some("The intermediate files were kept; see the log file for the ffmpeg error")
            }
            Self::Encoding { .. } => Some("See the log file for the ffmpeg error"),
            Self::OutputDirectory { .. } => {
                Some("Choose another directory with `config set outputDirectory <path>`")
            }
            Self::Routing(_) | Self::InvalidState(_) | Self::Cancelled => None,
        }
    }

    fn encoding(error: impl ToString, partial_files: Vec<PathBuf>) -> Self {
        Self::Encoding {
            message: error.to_string(),
            partial_files,
        }
    }
}

/// What to do when audio cannot be set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFallback {
    /// Keep recording the screen without sound
    VideoOnly,
    /// Fail the start
    #[default]
    Abort,
}

/// Per-session options that are not settings
#[derive(Debug, Clone)]
pub struct StartOptions {
    /// Record application audio when apps are selected
    pub record_audio: bool,
    pub audio_fallback: AudioFallback,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            record_audio: true,
            audio_fallback: AudioFallback::default(),
        }
    }
}

static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Process-wide token proving that no other session is active.
///
/// Released when dropped.
#[derive(Debug)]
pub struct SessionGuard {
    _private: (),
}

impl SessionGuard {
    pub fn acquire() -> Option<Self> {
        SESSION_ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { _private: () })
    }

    pub fn is_held() -> bool {
        SESSION_ACTIVE.load(Ordering::SeqCst)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        SESSION_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Adapters the recorder drives
#[derive(Clone)]
pub struct RecorderDeps {
    pub audio_server: Arc<dyn AudioServer>,
    pub audio_capture: Arc<dyn AudioCapture>,
    pub capture: Arc<dyn CaptureBackend>,
    pub muxer: Arc<dyn Muxer>,
    pub tools: Arc<dyn ToolLocator>,
}

/// Entry point for starting recordings
pub struct Recorder {
    deps: RecorderDeps,
}

/// Final and intermediate paths of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub output: PathBuf,
    pub video_temp: PathBuf,
    pub audio_temp: PathBuf,
}

impl SessionPaths {
    fn for_output(output: PathBuf) -> Self {
        Self {
            video_temp: temp_sibling(&output, "temp", "mkv"),
            audio_temp: temp_sibling(&output, "temp_audio", "wav"),
            output,
        }
    }
}

/// Audio pieces that were started successfully
struct AudioParts {
    router: Arc<AudioRouter>,
    capture: Arc<dyn AudioCapture>,
}

impl Recorder {
    pub fn new(deps: RecorderDeps) -> Self {
        Self { deps }
    }

    /// Start a recording session.
    ///
    /// On failure everything set up so far is torn down and no session is
    /// returned.
    pub async fn start(
        &self,
        config: &RecorderConfig,
        options: StartOptions,
    ) -> Result<RecordingSession, RecorderError> {
        let guard = SessionGuard::acquire().ok_or(RecorderError::AlreadyRecording)?;
        let config = config.clone().validated();
        let want_audio = options.record_audio && config.wants_audio();

        check_dependencies(self.deps.tools.as_ref(), want_audio).map_err(|missing| {
            error!("Missing dependency: {}", missing);
            RecorderError::DependencyMissing {
                binary: missing.binary,
                remedy: missing.remedy,
            }
        })?;

        let paths = SessionPaths::for_output(self.output_path(&config).await?);
        info!("Recording to {}", paths.output.display());

        let mut lifecycle = SessionLifecycle::new();
        lifecycle.begin()?;

        // a missing display or screen fails before any sink is created
        let source = match self.deps.capture.open_source(config.screen_index) {
            Ok(source) => source,
            Err(e) => {
                error!("Failed to open screen: {}", e);
                lifecycle.fail();
                return Err(RecorderError::Capture(e));
            }
        };

        let audio = if want_audio {
            match self.start_audio(&config, &paths).await {
                Ok(parts) => Some(parts),
                Err(e) if options.audio_fallback == AudioFallback::VideoOnly => {
                    warn!("Continuing without audio: {}", e);
                    None
                }
                Err(e) => {
                    lifecycle.fail();
                    return Err(e);
                }
            }
        } else {
            info!("No audio requested, recording video only");
            None
        };

        let capturer = match self.start_video(source, &config, &paths) {
            Ok(capturer) => capturer,
            Err(e) => {
                error!("Failed to start video capture: {}", e);
                if let Some(parts) = audio {
                    parts.capture.cancel().await;
                    parts.router.teardown().await;
                }
                lifecycle.fail();
                return Err(RecorderError::Capture(e));
            }
        };

        let (router, audio_capture) = match audio {
            Some(parts) => (Some(parts.router), Some(parts.capture)),
            None => (None, None),
        };

        Ok(RecordingSession {
            lifecycle,
            config,
            paths,
            capturer: Some(capturer),
            router,
            audio: audio_capture,
            muxer: Arc::clone(&self.deps.muxer),
            clock: RecordingClock::start(),
            last_stats: FrameStats::default(),
            outcome: None,
            _guard: guard,
        })
    }

    async fn output_path(&self, config: &RecorderConfig) -> Result<PathBuf, RecorderError> {
        let dir = &config.output_directory;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| RecorderError::OutputDirectory {
                path: dir.clone(),
                message: e.to_string(),
            })?;

        let extension = config.output_format.extension();
        Ok(if config.auto_increment_filename {
            incremental_filename(dir, extension)
        } else {
            let stamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            timestamped_filename(dir, &stamp.to_string(), extension)
        })
    }

    /// Route the selected apps and start recording the sink monitor.
    async fn start_audio(
        &self,
        config: &RecorderConfig,
        paths: &SessionPaths,
    ) -> Result<AudioParts, RecorderError> {
        let router = Arc::new(AudioRouter::new(
            Arc::clone(&self.deps.audio_server),
            config.audio_sample_rate,
            config.audio_channels,
        ));

        let sink = router.setup().await.map_err(|e| match e {
            AudioRouterError::Setup(source) => RecorderError::AudioSetup(source),
            other => RecorderError::Routing(other),
        })?;

        if let Err(e) = router.route_selected(&config.selected_apps).await {
            warn!("Routing failed: {}", e);
        }

        let spec = AudioCaptureSpec {
            source: sink.monitor_source(),
            output: paths.audio_temp.clone(),
            sample_rate: config.audio_sample_rate,
            channels: config.audio_channels,
        };
        let capture = Arc::clone(&self.deps.audio_capture);
        if let Err(e) = capture.start(&spec).await {
            error!("Failed to start audio recording: {}", e);
            router.teardown().await;
            return Err(RecorderError::encoding(e, Vec::new()));
        }

        info!("Audio recording started");
        Ok(AudioParts { router, capture })
    }

    fn start_video(
        &self,
        source: Box<dyn FrameSource>,
        config: &RecorderConfig,
        paths: &SessionPaths,
    ) -> Result<VideoCapturer, CaptureError> {
        let (width, height) = source.dimensions();
        debug!("Screen size {}x{}", width, height);

        let writer = self.deps.capture.open_writer(&VideoWriterSpec {
            output: paths.video_temp.clone(),
            width,
            height,
            frame_rate: config.frame_rate,
            codec: config.video_codec,
            quality: config.quality,
        })?;

        VideoCapturer::start(source, writer, config.frame_rate)
    }
}

/// Wall clock of a session minus its paused intervals
#[derive(Debug, Clone, Copy)]
struct RecordingClock {
    started: Instant,
    paused_since: Option<Instant>,
    paused_total: StdDuration,
    frozen: Option<StdDuration>,
}

impl RecordingClock {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            paused_since: None,
            paused_total: StdDuration::ZERO,
            frozen: None,
        }
    }

    fn pause(&mut self) {
        self.paused_since.get_or_insert_with(Instant::now);
    }

    fn resume(&mut self) {
        if let Some(since) = self.paused_since.take() {
            self.paused_total += since.elapsed();
        }
    }

    fn freeze(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.elapsed());
        }
    }

    fn elapsed(&self) -> StdDuration {
        if let Some(frozen) = self.frozen {
            return frozen;
        }
        let until = self.paused_since.unwrap_or_else(Instant::now);
        until
            .saturating_duration_since(self.started)
            .saturating_sub(self.paused_total)
    }
}

/// A running recording.
///
/// Holds the process-wide [`SessionGuard`]. Dropping a session that was not
/// stopped cancels audio capture and restores routing in the background.
pub struct RecordingSession {
    lifecycle: SessionLifecycle,
    config: RecorderConfig,
    paths: SessionPaths,
    capturer: Option<VideoCapturer>,
    router: Option<Arc<AudioRouter>>,
    audio: Option<Arc<dyn AudioCapture>>,
    muxer: Arc<dyn Muxer>,
    clock: RecordingClock,
    last_stats: FrameStats,
    outcome: Option<Result<RecordingOutcome, RecorderError>>,
    _guard: SessionGuard,
}

impl RecordingSession {
    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub async fn routes(&self) -> Vec<AudioRoute> {
        match &self.router {
            Some(router) => router.routes().await,
            None => Vec::new(),
        }
    }

    /// Recorded time so far, paused intervals excluded
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed().into()
    }

    pub fn stats(&self) -> FrameStats {
        self.capturer
            .as_ref()
            .map(VideoCapturer::stats)
            .unwrap_or(self.last_stats)
    }

    /// True once the capture loop died; the caller should stop the session
    pub fn capture_failed(&self) -> bool {
        self.capturer.as_ref().is_some_and(VideoCapturer::has_failed)
    }

    pub async fn pause(&mut self) -> Result<(), RecorderError> {
        self.lifecycle.pause()?;
        if let Some(capturer) = &self.capturer {
            capturer.pause();
        }
        if let Some(audio) = &self.audio {
            if let Err(e) = audio.pause().await {
                warn!("Failed to pause audio recording: {}", e);
            }
        }
        self.clock.pause();
        info!("Recording paused");
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<(), RecorderError> {
        self.lifecycle.resume()?;
        if let Some(audio) = &self.audio {
            if let Err(e) = audio.resume().await {
                warn!("Failed to resume audio recording: {}", e);
            }
        }
        if let Some(capturer) = &self.capturer {
            capturer.resume();
        }
        self.clock.resume();
        info!("Recording resumed");
        Ok(())
    }

    /// Pause when recording, resume when paused. Returns the new state.
    pub async fn toggle_pause(&mut self) -> Result<SessionState, RecorderError> {
        if self.lifecycle.is_paused() {
            self.resume().await?;
        } else {
            self.pause().await?;
        }
        Ok(self.state())
    }

    /// Stop everything and produce the final file.
    ///
    /// Idempotent: later calls return the first call's result.
    pub async fn stop(&mut self) -> Result<RecordingOutcome, RecorderError> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        self.lifecycle.begin_stop()?;
        self.clock.resume();
        self.clock.freeze();
        info!("Stopping recording after {}", self.elapsed().format_clock());

        let result = self.shutdown().await;
        match &result {
            Ok(outcome) => {
                self.lifecycle.finish()?;
                info!(
                    "Recording saved to {} ({})",
                    outcome.output.display(),
                    outcome.human_size()
                );
            }
            Err(e) => {
                self.lifecycle.fail();
                error!("Recording failed: {}", e);
            }
        }
        self.outcome = Some(result.clone());
        result
    }

    /// Discard the recording.
    ///
    /// Stops capture, kills the audio recorder, restores routing and deletes
    /// both intermediates. Nothing is merged and later `stop` calls return
    /// [`RecorderError::Cancelled`].
    pub async fn cancel(&mut self) -> Result<(), RecorderError> {
        self.lifecycle.cancel()?;
        self.clock.resume();
        self.clock.freeze();
        info!("Cancelling recording after {}", self.elapsed().format_clock());

        if let Some(capturer) = self.capturer.take() {
            match tokio::task::spawn_blocking(move || capturer.stop()).await {
                Ok(Ok(stats)) => self.last_stats = stats,
                Ok(Err(e)) => debug!("Video capture ended with an error: {}", e),
                Err(e) => warn!("Video capture thread failed: {}", e),
            }
        }
        if let Some(audio) = self.audio.take() {
            audio.cancel().await;
        }
        if let Some(router) = self.router.take() {
            router.teardown().await;
        }
        for temp in [&self.paths.video_temp, &self.paths.audio_temp] {
            remove_temp(temp).await;
        }

        self.outcome = Some(Err(RecorderError::Cancelled));
        info!("Recording cancelled, nothing was saved");
        Ok(())
    }

    /// Video first, then audio, then routing, then merge.
    async fn shutdown(&mut self) -> Result<RecordingOutcome, RecorderError> {
        let video_result = match self.capturer.take() {
            Some(capturer) => tokio::task::spawn_blocking(move || capturer.stop())
                .await
                .unwrap_or_else(|e| Err(CaptureError::Thread(e.to_string()))),
            None => Err(CaptureError::Thread("video capture was not running".to_string())),
        };

        let audio_path = match self.audio.take() {
            Some(audio) => match audio.stop().await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Audio recording failed, keeping video only: {}", e);
                    None
                }
            },
            None => None,
        };

        if let Some(router) = self.router.take() {
            router.teardown().await;
        }

        let stats = match video_result {
            Ok(stats) => stats,
            Err(e) => {
                return Err(RecorderError::encoding(
                    format!("video capture failed: {}", e),
                    self.existing_temps(),
                ))
            }
        };
        self.last_stats = stats;
        if stats.frames_dropped > 0 {
            warn!(
                "Dropped {} of {} frames ({:.1}%)",
                stats.frames_dropped,
                stats.scheduled(),
                stats.drop_rate() * 100.0
            );
        }

        let request = MergeRequest {
            video: self.paths.video_temp.clone(),
            audio: audio_path.clone(),
            output: self.paths.output.clone(),
            output_format: self.config.output_format,
            video_codec: self.config.video_codec,
            audio_bitrate: self.config.audio_bitrate.clone(),
            audio_delay_ms: self.config.audio_delay_ms,
        };
        if let Err(e) = self.muxer.merge(&request).await {
            return Err(RecorderError::encoding(e, self.existing_temps()));
        }

        for temp in [&self.paths.video_temp, &self.paths.audio_temp] {
            remove_temp(temp).await;
        }

        let size_bytes = tokio::fs::metadata(&self.paths.output)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(RecordingOutcome {
            output: self.paths.output.clone(),
            duration: self.elapsed(),
            stats,
            has_audio: audio_path.is_some(),
            size_bytes,
        })
    }

    fn existing_temps(&self) -> Vec<PathBuf> {
        [&self.paths.video_temp, &self.paths.audio_temp]
            .into_iter()
            .filter(|p| p.exists())
            .cloned()
            .collect()
    }
}

async fn remove_temp(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        warn!("Recording session dropped without stop, cleaning up");
        drop(self.capturer.take());

        let audio = self.audio.take();
        let router = self.router.take();
        if audio.is_none() && router.is_none() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Some(audio) = audio {
                        audio.cancel().await;
                    }
                    if let Some(router) = router {
                        router.teardown().await;
                    }
                });
            }
            Err(_) => warn!("No async runtime left, audio routing was not restored"),
        }
    }
}
