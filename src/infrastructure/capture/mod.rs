//! Screen capture backend: X11 grabs feeding an FFmpeg writer

#[cfg(target_os = "linux")]
mod x11;

#[cfg(target_os = "linux")]
pub use x11::{list_monitors, X11FrameSource};

use crate::application::ports::{
    CaptureBackend, CaptureError, FrameSource, VideoWriter, VideoWriterSpec,
};
use crate::domain::recording::Monitor;

use super::recording::{ensure_parent_exists, FfmpegVideoWriter};

/// Default capture backend for this platform
#[derive(Debug, Default)]
pub struct ScreenCaptureBackend;

impl ScreenCaptureBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for ScreenCaptureBackend {
    #[cfg(target_os = "linux")]
    fn list_monitors(&self) -> Result<Vec<Monitor>, CaptureError> {
        x11::list_monitors()
    }

    #[cfg(not(target_os = "linux"))]
    fn list_monitors(&self) -> Result<Vec<Monitor>, CaptureError> {
        Err(unsupported())
    }

    #[cfg(target_os = "linux")]
    fn open_source(&self, screen: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
        Ok(Box::new(X11FrameSource::connect(screen)?))
    }

    #[cfg(not(target_os = "linux"))]
    fn open_source(&self, _screen: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
        Err(unsupported())
    }

    fn open_writer(&self, spec: &VideoWriterSpec) -> Result<Box<dyn VideoWriter>, CaptureError> {
        ensure_parent_exists(&spec.output)?;
        Ok(Box::new(FfmpegVideoWriter::spawn(spec)?))
    }
}

#[cfg(not(target_os = "linux"))]
fn unsupported() -> CaptureError {
    CaptureError::DisplayUnavailable("screen capture is only supported on Linux/X11".to_string())
}
