//! Audio server port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::{ModuleId, SinkId, SinkInfo, StreamId, StreamInfo};

/// Audio server errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioServerError {
    #[error("pactl not found. Please install pulseaudio-utils.")]
    ToolNotFound,

    #[error("Audio server is not reachable: {0}")]
    Unreachable(String),

    #[error("'{command}' did not finish within {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("'{command}' failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected output from audio server: {0}")]
    Parse(String),
}

/// Port for the sound server control interface.
///
/// Every call is bounded in time by the adapter.
#[async_trait]
pub trait AudioServer: Send + Sync {
    /// Check that the server answers at all.
    async fn ping(&self) -> Result<(), AudioServerError>;

    async fn default_sink(&self) -> Result<SinkId, AudioServerError>;

    async fn list_sinks(&self) -> Result<Vec<SinkInfo>, AudioServerError>;

    /// Playing streams with the application that owns each one.
    async fn list_streams(&self) -> Result<Vec<StreamInfo>, AudioServerError>;

    /// Load a null sink named `name`.
    async fn load_null_sink(
        &self,
        name: &str,
        description: &str,
        sample_rate: u32,
        channels: u16,
    ) -> Result<ModuleId, AudioServerError>;

    /// Load a loopback from `source` into `sink`.
    async fn load_loopback(&self, source: &str, sink: &SinkId) -> Result<ModuleId, AudioServerError>;

    async fn move_stream(&self, stream: StreamId, sink: &SinkId) -> Result<(), AudioServerError>;

    async fn unload_module(&self, module: ModuleId) -> Result<(), AudioServerError>;
}
