//! Video codec and output container value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidValueError;

/// Video codec used for the intermediate screen capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoCodec {
    #[default]
    #[serde(rename = "XVID")]
    Xvid,
    #[serde(rename = "MJPG")]
    Mjpg,
    #[serde(rename = "mp4v")]
    Mp4v,
    #[serde(rename = "H264")]
    H264,
    #[serde(rename = "VP80")]
    Vp80,
    #[serde(rename = "VP90")]
    Vp90,
}

impl VideoCodec {
    pub const ALL: [VideoCodec; 6] = [
        Self::Xvid,
        Self::Mjpg,
        Self::Mp4v,
        Self::H264,
        Self::Vp80,
        Self::Vp90,
    ];

    const EXPECTED: &'static str = "XVID, MJPG, mp4v, H264, VP80, VP90";

    /// Settings-file spelling (FourCC)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Xvid => "XVID",
            Self::Mjpg => "MJPG",
            Self::Mp4v => "mp4v",
            Self::H264 => "H264",
            Self::Vp80 => "VP80",
            Self::Vp90 => "VP90",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::Xvid => "XVID (AVI)",
            Self::Mjpg => "Motion JPEG (AVI)",
            Self::Mp4v => "MPEG-4 (MP4)",
            Self::H264 => "H.264 (MP4)",
            Self::Vp80 => "VP8 (WebM)",
            Self::Vp90 => "VP9 (WebM)",
        }
    }

    /// FFmpeg encoder name
    pub const fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            Self::Xvid | Self::Mp4v => "mpeg4",
            Self::Mjpg => "mjpeg",
            Self::H264 => "libx264",
            Self::Vp80 => "libvpx",
            Self::Vp90 => "libvpx-vp9",
        }
    }

    /// Encoder arguments for a 1..=100 quality setting, tuned for live capture.
    pub fn encoder_args(&self, quality: u32) -> Vec<String> {
        let quality = quality.clamp(1, 100);
        let loss = 100 - quality;

        let mut args = vec!["-c:v".to_string(), self.ffmpeg_encoder().to_string()];
        match self {
            Self::Xvid | Self::Mp4v | Self::Mjpg => {
                // qscale 2 (best) ..= 31 (worst)
                args.extend(["-q:v".to_string(), (2 + loss * 29 / 100).to_string()]);
            }
            Self::H264 => {
                args.extend([
                    "-preset".to_string(),
                    "veryfast".to_string(),
                    "-crf".to_string(),
                    (loss * 51 / 100).to_string(),
                ]);
            }
            Self::Vp80 | Self::Vp90 => {
                let bitrate = if *self == Self::Vp80 { "10M" } else { "0" };
                args.extend([
                    "-deadline".to_string(),
                    "realtime".to_string(),
                    "-cpu-used".to_string(),
                    "8".to_string(),
                    "-crf".to_string(),
                    (4 + loss * 59 / 100).to_string(),
                    "-b:v".to_string(),
                    bitrate.to_string(),
                ]);
            }
        }

        let pix_fmt = if *self == Self::Mjpg { "yuvj420p" } else { "yuv420p" };
        args.extend(["-pix_fmt".to_string(), pix_fmt.to_string()]);
        args
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoCodec {
    type Err = InvalidValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|codec| codec.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidValueError {
                kind: "video codec",
                input: s.to_string(),
                expected: Self::EXPECTED,
            })
    }
}

/// Container format of the final recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Avi,
    Mkv,
    Webm,
    Mov,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [Self::Mp4, Self::Avi, Self::Mkv, Self::Webm, Self::Mov];

    const EXPECTED: &'static str = "mp4, avi, mkv, webm, mov";

    /// File extension without the leading dot
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
            Self::Mov => "mov",
        }
    }

    /// Video codec argument for the merge step: stream copy when the container
    /// accepts the capture codec, otherwise a re-encode target.
    pub const fn merge_video_codec(&self, captured: VideoCodec) -> &'static str {
        match (self, captured) {
            (Self::Webm, VideoCodec::Vp80 | VideoCodec::Vp90) => "copy",
            (Self::Webm, _) => "libvpx-vp9",
            (Self::Mp4 | Self::Mov, VideoCodec::H264) => "copy",
            (Self::Mp4 | Self::Mov, _) => "libx264",
            (Self::Avi | Self::Mkv, _) => "copy",
        }
    }

    pub const fn audio_codec(&self) -> &'static str {
        match self {
            Self::Webm => "libopus",
            Self::Avi => "libmp3lame",
            Self::Mp4 | Self::Mkv | Self::Mov => "aac",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = InvalidValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InvalidValueError {
                kind: "output format",
                input: s.to_string(),
                expected: Self::EXPECTED,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_parses_case_insensitively() {
        assert_eq!("xvid".parse::<VideoCodec>().unwrap(), VideoCodec::Xvid);
        assert_eq!("MP4V".parse::<VideoCodec>().unwrap(), VideoCodec::Mp4v);
        assert_eq!("VP90".parse::<VideoCodec>().unwrap(), VideoCodec::Vp90);
        assert!("theora".parse::<VideoCodec>().is_err());
    }

    #[test]
    fn codec_serializes_as_fourcc() {
        let json = serde_json::to_string(&VideoCodec::Mp4v).unwrap();
        assert_eq!(json, "\"mp4v\"");
        let codec: VideoCodec = serde_json::from_str("\"H264\"").unwrap();
        assert_eq!(codec, VideoCodec::H264);
    }

    #[test]
    fn qscale_follows_quality() {
        let best = VideoCodec::Xvid.encoder_args(100);
        let worst = VideoCodec::Xvid.encoder_args(1);
        assert!(best.windows(2).any(|w| w[0] == "-q:v" && w[1] == "2"));
        assert!(worst.windows(2).any(|w| w[0] == "-q:v" && w[1] == "30"));
    }

    #[test]
    fn h264_uses_crf() {
        let args = VideoCodec::H264.encoder_args(0);
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        // quality is clamped to 1
        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "50"));
    }

    #[test]
    fn mjpeg_uses_full_range_pixels() {
        let args = VideoCodec::Mjpg.encoder_args(90);
        assert!(args.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "yuvj420p"));
    }

    #[test]
    fn output_format_parses_with_dot() {
        assert_eq!(".MKV".parse::<OutputFormat>().unwrap(), OutputFormat::Mkv);
        assert!("flv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn merge_codec_copies_when_compatible() {
        assert_eq!(OutputFormat::Mkv.merge_video_codec(VideoCodec::Xvid), "copy");
        assert_eq!(OutputFormat::Mp4.merge_video_codec(VideoCodec::H264), "copy");
        assert_eq!(OutputFormat::Mp4.merge_video_codec(VideoCodec::Xvid), "libx264");
        assert_eq!(OutputFormat::Webm.merge_video_codec(VideoCodec::H264), "libvpx-vp9");
        assert_eq!(OutputFormat::Webm.merge_video_codec(VideoCodec::Vp80), "copy");
    }

    #[test]
    fn webm_audio_is_opus() {
        assert_eq!(OutputFormat::Webm.audio_codec(), "libopus");
        assert_eq!(OutputFormat::Mp4.audio_codec(), "aac");
    }
}
