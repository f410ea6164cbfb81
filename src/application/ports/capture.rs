//! Screen capture port interfaces
//!
//! Capture runs on a dedicated thread, so these ports are synchronous.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::config::VideoCodec;
use crate::domain::recording::{InvalidScreen, Monitor};

/// Bytes per pixel of a captured frame (BGRX)
pub const BYTES_PER_PIXEL: usize = 4;

/// One full-screen bitmap, 32-bit BGRX rows without padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn is_well_formed(&self) -> bool {
        self.data.len() == Self::expected_len(self.width, self.height)
    }
}

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Cannot open display: {0}")]
    DisplayUnavailable(String),

    #[error(transparent)]
    InvalidScreen(#[from] InvalidScreen),

    #[error("Screen grab failed: {0}")]
    GrabFailed(String),

    #[error("Frame is {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("Failed to start video writer: {0}")]
    WriterStart(String),

    #[error("Video writer failed: {0}")]
    WriterFailed(String),

    #[error("Capture thread failed: {0}")]
    Thread(String),
}

/// Source of screen bitmaps
pub trait FrameSource: Send {
    /// Width and height of every frame this source produces
    fn dimensions(&self) -> (u32, u32);

    fn grab(&mut self) -> Result<Frame, CaptureError>;
}

/// Sink of frames producing a video file
pub trait VideoWriter: Send {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), CaptureError>;

    /// Flush pending frames and wait for the file to be complete.
    fn finish(self: Box<Self>) -> Result<(), CaptureError>;
}

/// Parameters of the intermediate video file
#[derive(Debug, Clone, PartialEq)]
pub struct VideoWriterSpec {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub codec: VideoCodec,
    pub quality: u32,
}

/// Opens frame sources and writers for a session
pub trait CaptureBackend: Send + Sync {
    /// Monitors of the display, numbered from 1
    fn list_monitors(&self) -> Result<Vec<Monitor>, CaptureError>;

    /// Source grabbing monitor `screen`, or every monitor for
    /// [`ALL_SCREENS`](crate::domain::recording::ALL_SCREENS).
    ///
    /// An index with no monitor fails with [`CaptureError::InvalidScreen`].
    fn open_source(&self, screen: u32) -> Result<Box<dyn FrameSource>, CaptureError>;

    fn open_writer(&self, spec: &VideoWriterSpec) -> Result<Box<dyn VideoWriter>, CaptureError>;
}
