//! `pactl` audio server adapter

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::application::ports::{AudioServer, AudioServerError};
use crate::domain::audio::{ModuleId, SinkId, SinkInfo, StreamId, StreamInfo};
use crate::infrastructure::system::detached_command;

use super::parser;

/// Bounded wait for a single pactl call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Talks to PulseAudio (or pipewire-pulse) through the `pactl` CLI
pub struct PactlAudioServer {
    program: String,
    timeout: Duration,
}

impl PactlAudioServer {
    pub fn new() -> Self {
        Self {
            program: "pactl".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use another executable, e.g. a test double
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Run pactl and return stdout. Non-zero exit is an error.
    async fn run(&self, args: &[&str]) -> Result<String, AudioServerError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("Running {}", command);

        let child = Command::from(detached_command(&self.program))
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AudioServerError::ToolNotFound
                } else {
                    AudioServerError::CommandFailed {
                        command: command.clone(),
                        code: None,
                        stderr: e.to_string(),
                    }
                }
            })?;

        // dropping the future on timeout kills the child
        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AudioServerError::Timeout {
                command: command.clone(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| AudioServerError::CommandFailed {
                command: command.clone(),
                code: None,
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AudioServerError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for PactlAudioServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioServer for PactlAudioServer {
    async fn ping(&self) -> Result<(), AudioServerError> {
        self.run(&["info"]).await.map(|_| ()).map_err(|e| match e {
            AudioServerError::CommandFailed { stderr, .. } => AudioServerError::Unreachable(stderr),
            other => other,
        })
    }

    async fn default_sink(&self) -> Result<SinkId, AudioServerError> {
        let output = self.run(&["get-default-sink"]).await?;
        parser::parse_default_sink(&output)
    }

    async fn list_sinks(&self) -> Result<Vec<SinkInfo>, AudioServerError> {
        let output = self.run(&["list", "short", "sinks"]).await?;
        Ok(parser::parse_short_sinks(&output))
    }

    async fn list_streams(&self) -> Result<Vec<StreamInfo>, AudioServerError> {
        let output = self.run(&["list", "sink-inputs"]).await?;
        Ok(parser::parse_sink_inputs(&output))
    }

    async fn load_null_sink(
        &self,
        name: &str,
        description: &str,
        sample_rate: u32,
        channels: u16,
    ) -> Result<ModuleId, AudioServerError> {
        let sink_name = format!("sink_name={}", name);
        let rate = format!("rate={}", sample_rate);
        let channels = format!("channels={}", channels);
        let properties = format!("sink_properties=device.description={}", description);
        let output = self
            .run(&["load-module", "module-null-sink", &sink_name, &rate, &channels, &properties])
            .await?;
        parser::parse_module_id(&output)
    }

    async fn load_loopback(&self, source: &str, sink: &SinkId) -> Result<ModuleId, AudioServerError> {
        let source = format!("source={}", source);
        let sink = format!("sink={}", sink);
        let output = self
            .run(&["load-module", "module-loopback", &source, &sink, "latency_msec=50"])
            .await?;
        parser::parse_module_id(&output)
    }

    async fn move_stream(&self, stream: StreamId, sink: &SinkId) -> Result<(), AudioServerError> {
        let stream = stream.to_string();
        self.run(&["move-sink-input", &stream, sink.as_str()]).await?;
        Ok(())
    }

    async fn unload_module(&self, module: ModuleId) -> Result<(), AudioServerError> {
        let module = module.to_string();
        self.run(&["unload-module", &module]).await?;
        Ok(())
    }
}
