//! Desktop notification port

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Failed to show notification: {0}")]
    SendFailed(String),
}

/// Icon matching each recording event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationIcon {
    /// Recording started
    Recording,
    /// File saved
    Success,
    /// Recording discarded
    Warning,
    /// Start or save failed
    Error,
}

impl NotificationIcon {
    /// freedesktop icon name
    pub const fn icon_name(&self) -> &'static str {
        match self {
            Self::Recording => "media-record",
            Self::Success => "dialog-ok",
            Self::Warning => "dialog-warning",
            Self::Error => "dialog-error",
        }
    }
}

/// Sends recording events to the desktop.
///
/// Failures are reported but never stop a recording.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError>;
}
