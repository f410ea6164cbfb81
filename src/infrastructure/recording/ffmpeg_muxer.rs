//! Final merge of the intermediate video and audio files

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::application::ports::{EncodingError, MergeRequest, Muxer};

use crate::infrastructure::system::detached_command;

/// Long recordings re-encoded to mp4 can take a while
pub const MERGE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Lines of encoder stderr kept in errors
const STDERR_TAIL_LINES: usize = 20;

/// Runs a one-shot ffmpeg merge
pub struct FfmpegMuxer {
    program: String,
    timeout: Duration,
}

impl FfmpegMuxer {
    pub fn new() -> Self {
        Self::with_program("ffmpeg", MERGE_TIMEOUT)
    }

    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Build the merge command line.
    ///
    /// A positive delay pads the audio with `adelay`. A negative delay pads the
    /// start of the video with `tpad`, which needs a video re-encode.
    pub fn build_merge_args(request: &MergeRequest) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostats", "-nostdin", "-y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut video_codec = request.output_format.merge_video_codec(request.video_codec);

        args.extend(["-i".to_string(), request.video.to_string_lossy().to_string()]);

        let Some(audio) = &request.audio else {
            args.extend([
                "-map".to_string(),
                "0:v".to_string(),
                "-c:v".to_string(),
                video_codec.to_string(),
                request.output.to_string_lossy().to_string(),
            ]);
            return args;
        };

        args.extend(["-i".to_string(), audio.to_string_lossy().to_string()]);

        let delay = request.audio_delay_ms;
        if delay > 0 {
            args.extend([
                "-filter_complex".to_string(),
                format!("[1:a]adelay={delay}|{delay}[delayed_audio]"),
                "-map".to_string(),
                "0:v".to_string(),
                "-map".to_string(),
                "[delayed_audio]".to_string(),
            ]);
        } else if delay < 0 {
            if video_codec == "copy" {
                video_codec = request.video_codec.ffmpeg_encoder();
            }
            args.extend([
                "-filter_complex".to_string(),
                format!("[0:v]tpad=start_duration={}[delayed_video]", seconds(delay.unsigned_abs())),
                "-map".to_string(),
                "[delayed_video]".to_string(),
                "-map".to_string(),
                "1:a".to_string(),
            ]);
        } else {
            args.extend([
                "-map".to_string(),
                "0:v".to_string(),
                "-map".to_string(),
                "1:a".to_string(),
            ]);
        }

        args.extend([
            "-c:v".to_string(),
            video_codec.to_string(),
            "-c:a".to_string(),
            request.output_format.audio_codec().to_string(),
            "-b:a".to_string(),
            request.audio_bitrate.clone(),
            "-shortest".to_string(),
            request.output.to_string_lossy().to_string(),
        ]);
        args
    }
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new()
    }
}

/// `250` -> `0.25`
fn seconds(millis: u32) -> String {
    let secs = millis as f64 / 1000.0;
    let text = format!("{:.3}", secs);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n").trim().to_string()
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn merge(&self, request: &MergeRequest) -> Result<(), EncodingError> {
        let args = Self::build_merge_args(request);
        debug!("Merging: {} {}", self.program, args.join(" "));

        let child = Command::from(detached_command(&self.program))
            .args(&args)
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
            })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| EncodingError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| EncodingError::Io(e.to_string()))?;

        if !output.status.success() {
            return Err(EncodingError::ProcessFailed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        match tokio::fs::metadata(&request.output).await {
            Ok(meta) if meta.len() > 0 => {
                info!("Merged into {} ({} bytes)", request.output.display(), meta.len());
                Ok(())
            }
            _ => Err(EncodingError::ProcessFailed {
                code: output.status.code(),
                stderr: "encoder finished without writing the output".to_string(),
            }),
        }
    }
}
