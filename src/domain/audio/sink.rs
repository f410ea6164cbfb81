//! Sink, module and stream identifiers

use std::fmt;
use std::str::FromStr;

/// Name of the virtual sink that selected applications are routed into
pub const RECORD_SINK_NAME: &str = "record_sink";

/// Human readable description shown by mixers for the virtual sink
pub const RECORD_SINK_DESCRIPTION: &str = "RecordSink";

/// Identifier of an audio sink.
///
/// The audio server accepts either a sink name or its numeric index
/// wherever a sink is expected, so both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SinkId(String);

impl SinkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The virtual recording sink
    pub fn record_sink() -> Self {
        Self::new(RECORD_SINK_NAME)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the monitor source that mirrors this sink
    pub fn monitor_source(&self) -> String {
        format!("{}.monitor", self.0)
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of a module loaded into the audio server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModuleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ModuleId)
    }
}

/// Index of a playback stream ("sink input")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u32);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StreamId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(StreamId)
    }
}

/// A sink known to the audio server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkInfo {
    pub index: u32,
    pub name: String,
    pub state: Option<String>,
}

impl SinkInfo {
    pub fn is_record_sink(&self) -> bool {
        self.name == RECORD_SINK_NAME
    }
}

/// A playing stream and the application that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub id: StreamId,
    pub app_name: String,
    /// Sink the stream currently plays into
    pub sink: SinkId,
}

impl StreamInfo {
    /// Case-insensitive substring match against a selected application name
    pub fn matches_app(&self, selected: &str) -> bool {
        let selected = selected.trim();
        !selected.is_empty()
            && self
                .app_name
                .to_lowercase()
                .contains(&selected.to_lowercase())
    }
}
