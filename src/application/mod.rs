//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod audio_router;
pub mod dependencies;
pub mod ports;
pub mod recording;
pub mod video_capturer;

// Re-export use cases
pub use audio_router::{AudioRouter, AudioRouterError, TeardownReport};
pub use dependencies::{check_dependencies, MissingDependency};
pub use recording::{
    AudioFallback, Recorder, RecorderDeps, RecorderError, RecordingSession, SessionGuard,
    SessionPaths, StartOptions,
};
pub use video_capturer::VideoCapturer;
