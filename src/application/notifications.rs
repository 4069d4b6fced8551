// User-visible notifications published by editor sessions
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    TemplateMissing,
    DuplicateId,
    InvalidConfig,
    InvalidImport,
    GridFull,
    PersistenceFailure,
    Saved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub dashboard_id: String,
    pub level: NotificationLevel,
    pub kind: NotificationKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Fan-out of notifications to every connected listener. Publishing with no
/// listener is fine; the notification is simply dropped.
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn publish(
        &self,
        dashboard_id: &str,
        level: NotificationLevel,
        kind: NotificationKind,
        message: impl Into<String>,
    ) {
        let notification = Notification {
            dashboard_id: dashboard_id.to_string(),
            level,
            kind,
            message: message.into(),
            at: Utc::now(),
        };
        let _ = self.sender.send(notification);
    }

    pub fn error(&self, dashboard_id: &str, kind: NotificationKind, message: impl Into<String>) {
        self.publish(dashboard_id, NotificationLevel::Error, kind, message);
    }

    pub fn warning(&self, dashboard_id: &str, kind: NotificationKind, message: impl Into<String>) {
        self.publish(dashboard_id, NotificationLevel::Warning, kind, message);
    }

    pub fn info(&self, dashboard_id: &str, kind: NotificationKind, message: impl Into<String>) {
        self.publish(dashboard_id, NotificationLevel::Info, kind, message);
    }
}
