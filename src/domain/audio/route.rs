//! Audio route entity

use super::sink::{SinkId, StreamId};

/// Restoration state of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStatus {
    /// Stream currently plays into the recording sink
    Active,
    /// Stream was moved back to its original sink
    Restored,
    /// Moving the stream back failed (usually because the stream is gone)
    RestoreFailed(String),
}

/// One application stream redirected into the recording sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRoute {
    pub stream_id: StreamId,
    pub app_name: String,
    pub original_sink: SinkId,
    pub target_sink: SinkId,
    status: RouteStatus,
}

impl AudioRoute {
    pub fn new(
        stream_id: StreamId,
        app_name: impl Into<String>,
        original_sink: SinkId,
        target_sink: SinkId,
    ) -> Self {
        Self {
            stream_id,
            app_name: app_name.into(),
            original_sink,
            target_sink,
            status: RouteStatus::Active,
        }
    }

    pub fn status(&self) -> &RouteStatus {
        &self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == RouteStatus::Active
    }

    pub fn is_restored(&self) -> bool {
        self.status == RouteStatus::Restored
    }

    pub fn mark_restored(&mut self) {
        self.status = RouteStatus::Restored;
    }

    pub fn mark_restore_failed(&mut self, reason: impl Into<String>) {
        self.status = RouteStatus::RestoreFailed(reason.into());
    }
}
