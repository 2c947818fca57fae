//! Alert change notifications.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, implementing the engine's `AlertNotifier`.
//! - [`EventLogger`]: background consumer that logs every change; the
//!   real-time delivery transport subscribes the same way.

pub mod bus;
pub mod logger;

pub use bus::EventBus;
pub use logger::EventLogger;
