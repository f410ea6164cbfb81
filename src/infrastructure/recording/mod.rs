//! FFmpeg adapters for audio capture, video encoding and the final merge

mod ffmpeg_audio;
mod ffmpeg_muxer;
mod ffmpeg_video;

pub use ffmpeg_audio::FfmpegAudioCapture;
pub use ffmpeg_muxer::{FfmpegMuxer, MERGE_TIMEOUT};
pub use ffmpeg_video::{ensure_parent_exists, FfmpegVideoWriter};
