//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_server;
pub mod capture;
pub mod config;
pub mod dependency;
pub mod encoder;
pub mod notifier;

// Re-export common types
pub use audio_server::{AudioServer, AudioServerError};
pub use capture::{
    CaptureBackend, CaptureError, Frame, FrameSource, VideoWriter, VideoWriterSpec,
    BYTES_PER_PIXEL,
};
pub use config::{LoadNote, LoadedSettings, SettingsStore};
pub use dependency::ToolLocator;
pub use encoder::{AudioCapture, AudioCaptureSpec, EncodingError, MergeRequest, Muxer};
pub use notifier::{NotificationError, NotificationIcon, Notifier};
