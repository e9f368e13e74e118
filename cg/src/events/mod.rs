//! Client events
//!
//! Clients never print. They emit [`ClientEvent`]s on an [`EventBus`], and
//! whatever front end is attached (the `cg` binary, a test) subscribes and
//! decides how to show them.
//!
//! ```rust,ignore
//! let bus = EventBus::with_default_capacity();
//! let mut rx = bus.subscribe();
//! let intake = FileIntake::new(&config.intake, bus.emitter());
//! ```

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter};
pub use types::{ClientEvent, Notification, Severity};
