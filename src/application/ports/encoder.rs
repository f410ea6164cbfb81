//! Audio capture and muxing port interfaces

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::config::{OutputFormat, VideoCodec};

/// Encoder errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("FFmpeg not found. Please install ffmpeg.")]
    FfmpegNotFound,

    #[error("Failed to start encoder: {0}")]
    StartFailed(String),

    #[error("Encoder exited with code {code:?}: {stderr}")]
    ProcessFailed { code: Option<i32>, stderr: String },

    #[error("Encoder did not finish within {0}s")]
    Timeout(u64),

    #[error("No capture in progress")]
    NotRunning,

    #[error("Capture already in progress")]
    AlreadyRunning,

    #[error("Encoder I/O error: {0}")]
    Io(String),
}

/// What the audio capture process records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCaptureSpec {
    /// Audio server source, e.g. `record_sink.monitor`
    pub source: String,
    pub output: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Port for the long-running audio capture process
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Start recording. Fails if the process dies right away.
    async fn start(&self, spec: &AudioCaptureSpec) -> Result<(), EncodingError>;

    /// Freeze the capture process.
    async fn pause(&self) -> Result<(), EncodingError>;

    async fn resume(&self) -> Result<(), EncodingError>;

    /// Stop gracefully and return the finished file.
    async fn stop(&self) -> Result<PathBuf, EncodingError>;

    /// Kill the process and delete its output.
    async fn cancel(&self);

    fn is_recording(&self) -> bool;
}

/// Inputs and options of the final merge step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub video: PathBuf,
    /// `None` remuxes the video alone
    pub audio: Option<PathBuf>,
    pub output: PathBuf,
    pub output_format: OutputFormat,
    pub video_codec: VideoCodec,
    pub audio_bitrate: String,
    /// Positive delays the audio, negative delays the video
    pub audio_delay_ms: i32,
}

/// Port for combining intermediates into the final container
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn merge(&self, request: &MergeRequest) -> Result<(), EncodingError>;
}
