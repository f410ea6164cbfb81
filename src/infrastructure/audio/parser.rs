//! Parsers for `pactl` text output
//!
//! Grammar handled here:
//! - `list short sinks`: one sink per line, tab separated
//!   `<index>\t<name>\t<driver>\t<sample spec>\t<state>`
//! - `list sink-inputs`: blocks starting with `Sink Input #<id>`, followed by
//!   indented `Key: value` lines and, under `Properties:`, `key = "value"` lines
//! - `load-module`: the new module index on a line of its own

use crate::application::ports::AudioServerError;
use crate::domain::audio::{ModuleId, SinkId, SinkInfo, StreamId, StreamInfo};

const SINK_INPUT_HEADER: &str = "Sink Input #";

/// Index printed by `pactl load-module`
pub fn parse_module_id(output: &str) -> Result<ModuleId, AudioServerError> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| AudioServerError::Parse("empty load-module output".to_string()))?
        .parse()
        .map_err(|_| AudioServerError::Parse(format!("not a module index: '{}'", output.trim())))
}

/// Sink name printed by `pactl get-default-sink`
pub fn parse_default_sink(output: &str) -> Result<SinkId, AudioServerError> {
    let name = output.trim();
    if name.is_empty() {
        return Err(AudioServerError::Parse("empty default sink".to_string()));
    }
    Ok(SinkId::new(name))
}

/// Lines of `pactl list short sinks`. Malformed lines are skipped.
pub fn parse_short_sinks(output: &str) -> Vec<SinkInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t').map(str::trim);
            let index = fields.next()?.parse().ok()?;
            let name = fields.next().filter(|n| !n.is_empty())?.to_string();
            let state = fields.nth(2).filter(|s| !s.is_empty()).map(str::to_string);
            Some(SinkInfo { index, name, state })
        })
        .collect()
}

/// Blocks of `pactl list sink-inputs`.
///
/// The application name comes from `application.name`, falling back to
/// `application.process.binary`. Streams with neither are skipped.
pub fn parse_sink_inputs(output: &str) -> Vec<StreamInfo> {
    output
        .split(SINK_INPUT_HEADER)
        .skip(1)
        .filter_map(parse_sink_input_block)
        .collect()
}

fn parse_sink_input_block(block: &str) -> Option<StreamInfo> {
    let mut lines = block.lines();
    let id: StreamId = lines.next()?.trim().parse().ok()?;

    let mut sink = None;
    let mut app_name = None;
    let mut binary = None;

    for line in lines {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("Sink:") {
            sink = Some(SinkId::new(value.trim()));
        } else if let Some((key, value)) = property(line) {
            match key {
                "application.name" => app_name = Some(value),
                "application.process.binary" => binary = Some(value),
                _ => {}
            }
        }
    }

    Some(StreamInfo {
        id,
        app_name: app_name.or(binary)?,
        sink: sink?,
    })
}

/// `key = "value"` with the quotes removed
fn property(line: &str) -> Option<(&str, String)> {
    let (key, value) = line.split_once(" = ")?;
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some((key.trim(), value.to_string()))
}
