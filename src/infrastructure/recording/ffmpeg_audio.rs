//! FFmpeg-based audio capture adapter

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::application::ports::{AudioCapture, AudioCaptureSpec, EncodingError};

use crate::infrastructure::system::detached_command;

/// How long a freshly spawned process must survive to count as started
const STARTUP_CHECK: Duration = Duration::from_millis(500);

/// How long ffmpeg gets to finalize the WAV after SIGINT
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Records an audio server source to WAV with a long-running ffmpeg
pub struct FfmpegAudioCapture {
    program: String,
    /// Current FFmpeg process
    process: Arc<Mutex<Option<Child>>>,
    /// Current output path
    output_path: Arc<Mutex<Option<PathBuf>>>,
    is_recording: Arc<AtomicBool>,
    is_paused: AtomicBool,
}

impl FfmpegAudioCapture {
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            process: Arc::new(Mutex::new(None)),
            output_path: Arc::new(Mutex::new(None)),
            is_recording: Arc::new(AtomicBool::new(false)),
            is_paused: AtomicBool::new(false),
        }
    }

    /// Build FFmpeg args for recording
    pub fn build_ffmpeg_args(spec: &AudioCaptureSpec) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostats", "-nostdin", "-y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.extend([
            "-f".to_string(),
            "pulse".to_string(),
            "-i".to_string(),
            spec.source.clone(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            spec.sample_rate.to_string(),
            "-ac".to_string(),
            spec.channels.to_string(),
            spec.output.to_string_lossy().to_string(),
        ]);

        args
    }

    fn spawn_ffmpeg(&self, args: &[String]) -> Result<Child, EncodingError> {
        Command::from(detached_command(&self.program))
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncodingError::FfmpegNotFound
                } else {
                    EncodingError::StartFailed(e.to_string())
                }
            })
    }

    /// Send signal to FFmpeg process
    fn send_signal(child: &Child, sig: Signal) -> Result<(), EncodingError> {
        if let Some(id) = child.id() {
            signal::kill(Pid::from_raw(id as i32), sig)
                .map_err(|e| EncodingError::Io(format!("Signal {:?} failed: {}", sig, e)))?;
        }
        Ok(())
    }

    async fn read_stderr(child: &mut Child) -> String {
        let mut buf = Vec::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).trim().to_string()
    }
}

impl Default for FfmpegAudioCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCapture for FfmpegAudioCapture {
    async fn start(&self, spec: &AudioCaptureSpec) -> Result<(), EncodingError> {
        let mut process_guard = self.process.lock().await;
        if process_guard.is_some() {
            return Err(EncodingError::AlreadyRunning);
        }

        let args = Self::build_ffmpeg_args(spec);
        debug!("Starting audio capture: {} {}", self.program, args.join(" "));
        let mut child = self.spawn_ffmpeg(&args)?;

        // ffmpeg exits at once when the source does not exist
        sleep(STARTUP_CHECK).await;
        if let Ok(Some(status)) = child.try_wait() {
            let stderr = Self::read_stderr(&mut child).await;
            return Err(EncodingError::ProcessFailed {
                code: status.code(),
                stderr,
            });
        }

        *self.output_path.lock().await = Some(spec.output.clone());
        *process_guard = Some(child);
        self.is_recording.store(true, Ordering::SeqCst);
        self.is_paused.store(false, Ordering::SeqCst);
        info!("Audio capture started from {}", spec.source);
        Ok(())
    }

    async fn pause(&self) -> Result<(), EncodingError> {
        let process_guard = self.process.lock().await;
        let child = process_guard.as_ref().ok_or(EncodingError::NotRunning)?;
        Self::send_signal(child, Signal::SIGSTOP)?;
        self.is_paused.store(true, Ordering::SeqCst);
        debug!("Audio capture paused");
        Ok(())
    }

    async fn resume(&self) -> Result<(), EncodingError> {
        let process_guard = self.process.lock().await;
        let child = process_guard.as_ref().ok_or(EncodingError::NotRunning)?;
        Self::send_signal(child, Signal::SIGCONT)?;
        self.is_paused.store(false, Ordering::SeqCst);
        debug!("Audio capture resumed");
        Ok(())
    }

    async fn stop(&self) -> Result<PathBuf, EncodingError> {
        let mut process_guard = self.process.lock().await;
        let child = process_guard.take().ok_or(EncodingError::NotRunning)?;
        self.is_recording.store(false, Ordering::SeqCst);

        // a stopped process cannot handle SIGINT
        if self.is_paused.swap(false, Ordering::SeqCst) {
            Self::send_signal(&child, Signal::SIGCONT)?;
        }

        // Send SIGINT for graceful stop (FFmpeg will finalize the file)
        Self::send_signal(&child, Signal::SIGINT)?;

        let stderr = match timeout(STOP_TIMEOUT, child.wait_with_output()).await {
            Ok(Ok(output)) => String::from_utf8_lossy(&output.stderr).trim().to_string(),
            Ok(Err(e)) => return Err(EncodingError::Io(e.to_string())),
            Err(_) => {
                warn!("Audio capture did not stop within {}s, killed", STOP_TIMEOUT.as_secs());
                String::new()
            }
        };

        let output_path = self
            .output_path
            .lock()
            .await
            .take()
            .ok_or(EncodingError::NotRunning)?;

        match fs::metadata(&output_path).await {
            Ok(meta) if meta.len() > 0 => {
                info!("Audio capture stopped, {} bytes", meta.len());
                Ok(output_path)
            }
            _ => Err(EncodingError::ProcessFailed {
                code: None,
                stderr: if stderr.is_empty() {
                    "no audio was written".to_string()
                } else {
                    stderr
                },
            }),
        }
    }

    async fn cancel(&self) {
        let mut process_guard = self.process.lock().await;
        if let Some(mut child) = process_guard.take() {
            self.is_recording.store(false, Ordering::SeqCst);
            self.is_paused.store(false, Ordering::SeqCst);

            // Send SIGKILL for immediate termination
            let _ = child.start_kill();
            let _ = child.wait().await;
        }

        let output_path = self.output_path.lock().await.take();
        if let Some(path) = output_path {
            let _ = fs::remove_file(&path).await;
        }
    }

    fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }
}
