//! FFmpeg video writer fed with raw frames over stdin

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Stdio};

use tracing::{debug, info};

use crate::application::ports::{CaptureError, Frame, VideoWriter, VideoWriterSpec};

use crate::infrastructure::system::detached_command;

/// Encodes BGRX frames into the intermediate Matroska file
pub struct FfmpegVideoWriter {
    process: Child,
    stdin: Option<ChildStdin>,
    frame_len: usize,
    frame_count: u64,
}

impl FfmpegVideoWriter {
    /// Build FFmpeg args: rawvideo on stdin, codec from the settings, mkv out
    pub fn build_ffmpeg_args(spec: &VideoWriterSpec) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostats", "-y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.extend([
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "bgr0".to_string(),
            "-s".to_string(),
            format!("{}x{}", spec.width, spec.height),
            "-r".to_string(),
            format_rate(spec.frame_rate),
            "-i".to_string(),
            "-".to_string(),
        ]);

        // yuv420p needs even dimensions
        if spec.width % 2 != 0 || spec.height % 2 != 0 {
            args.extend(["-vf".to_string(), "crop=trunc(iw/2)*2:trunc(ih/2)*2".to_string()]);
        }

        args.extend(spec.codec.encoder_args(spec.quality));
        args.extend([
            "-f".to_string(),
            "matroska".to_string(),
            spec.output.to_string_lossy().to_string(),
        ]);
        args
    }

    pub fn spawn(spec: &VideoWriterSpec) -> Result<Self, CaptureError> {
        Self::spawn_with("ffmpeg", spec)
    }

    pub fn spawn_with(program: &str, spec: &VideoWriterSpec) -> Result<Self, CaptureError> {
        let args = Self::build_ffmpeg_args(spec);
        info!("Starting video encoder: {} {}", program, args.join(" "));

        let mut process = detached_command(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CaptureError::WriterStart(format!("{}: {}", program, e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| CaptureError::WriterStart("Failed to capture FFmpeg stdin".to_string()))?;

        Ok(Self {
            process,
            stdin: Some(stdin),
            frame_len: Frame::expected_len(spec.width, spec.height),
            frame_count: 0,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// `30`, `29.97` etc.
fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{}", rate as u64)
    } else {
        format!("{:.3}", rate)
    }
}

impl VideoWriter for FfmpegVideoWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        if frame.data.len() != self.frame_len {
            return Err(CaptureError::FrameSize {
                expected: self.frame_len,
                actual: frame.data.len(),
            });
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| CaptureError::WriterFailed("encoder input closed".to_string()))?;
        stdin
            .write_all(&frame.data)
            .map_err(|e| CaptureError::WriterFailed(format!("Failed to write frame: {}", e)))?;
        self.frame_count += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), CaptureError> {
        // Close stdin to signal EOF to FFmpeg
        drop(self.stdin.take());

        let frame_count = self.frame_count;
        let output = self
            .process
            .wait_with_output()
            .map_err(|e| CaptureError::WriterFailed(format!("Failed to wait for FFmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::WriterFailed(format!(
                "FFmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        debug!("Video encoder finished: {} frames written", frame_count);
        Ok(())
    }
}

/// Output path sanity check used before spawning
pub fn ensure_parent_exists(path: &Path) -> Result<(), CaptureError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => Err(
            CaptureError::WriterStart(format!("directory {} does not exist", parent.display())),
        ),
        _ => Ok(()),
    }
}
