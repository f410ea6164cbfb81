//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod config;
pub mod error;
pub mod recording;
pub mod session;

// Re-export common types
pub use audio::{AudioRoute, ModuleId, RouteStatus, SinkId, SinkInfo, StreamId, StreamInfo};
pub use config::{OutputFormat, RecorderConfig, VideoCodec};
pub use error::*;
pub use recording::{Duration, FrameStats, RecordingOutcome};
pub use session::{InvalidStateTransition, SessionLifecycle, SessionState};
