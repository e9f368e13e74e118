//! Event types for clauseguard client activity
//!
//! These events are everything a front end needs to show besides the
//! clients' own state:
//! - Notifications (the toast messages of a browser UI)
//! - Per-file status changes during upload
//! - The redirect to the analysis view after an upload

use serde::{Deserialize, Serialize};

use crate::domain::FileStatus;

/// Notification severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// A user-facing notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Client event vocabulary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// A notification to show the user
    Notified { notification: Notification },
    /// A staged file changed upload status
    FileStatusChanged {
        file_id: String,
        name: String,
        status: FileStatus,
    },
    /// Upload finished and the analysis view should open on this URL
    Redirect { url: String },
}

impl ClientEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::Notified { .. } => "Notified",
            ClientEvent::FileStatusChanged { .. } => "FileStatusChanged",
            ClientEvent::Redirect { .. } => "Redirect",
        }
    }

    /// The notification carried by this event, if any
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            ClientEvent::Notified { notification } => Some(notification),
            _ => None,
        }
    }
}
