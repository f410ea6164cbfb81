//! Audio routing domain module

mod route;
mod sink;

pub use route::{AudioRoute, RouteStatus};
pub use sink::{ModuleId, SinkId, SinkInfo, StreamId, StreamInfo, RECORD_SINK_DESCRIPTION, RECORD_SINK_NAME};
