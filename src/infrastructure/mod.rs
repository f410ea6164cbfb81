//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces, integrating with
//! pactl, FFmpeg, the X server and the desktop.

pub mod audio;
pub mod capture;
pub mod config;
pub mod notification;
pub mod recording;
pub mod system;

// Re-export adapters
pub use audio::PactlAudioServer;
pub use capture::ScreenCaptureBackend;
pub use config::JsonSettingsStore;
pub use notification::NotifyRustNotifier;
pub use recording::{FfmpegAudioCapture, FfmpegMuxer, FfmpegVideoWriter};
pub use system::PathLookup;
