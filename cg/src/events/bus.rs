//! Event Bus - pub/sub for client events
//!
//! Uses a tokio broadcast channel so any number of views (the CLI printer,
//! tests) can observe what the clients report.


use tokio::sync::broadcast;
use tracing::debug;

use super::types::{ClientEvent, Notification};
use crate::domain::UploadedFile;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Central event bus for client activity
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn emit(&self, event: ClientEvent) {
        debug!(event_type = event.event_type(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create a cloneable emitter handle
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter { tx: self.tx.clone() }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for clients to emit events without owning the bus
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventEmitter {
    /// An emitter with no bus behind it; every event is dropped
    pub fn detached() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Emit a raw event
    pub fn emit(&self, event: ClientEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    // === Convenience methods ===

    pub fn notify(&self, notification: Notification) {
        self.emit(ClientEvent::Notified { notification });
    }

    /// Emit an informational notification
    pub fn info(&self, title: &str, description: &str) {
        self.notify(Notification::info(title, description));
    }

    /// Emit an error notification
    pub fn error(&self, title: &str, description: &str) {
        self.notify(Notification::error(title, description));
    }

    /// Emit the current status of a staged file
    pub fn file_status(&self, file: &UploadedFile) {
        self.emit(ClientEvent::FileStatusChanged {
            file_id: file.id().to_string(),
            name: file.name().to_string(),
            status: file.status(),
        });
    }

    pub fn redirect(&self, url: &str) {
        self.emit(ClientEvent::Redirect { url: url.to_string() });
    }
}
