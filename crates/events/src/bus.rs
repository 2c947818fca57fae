//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans every [`AlertChanged`] out to all current subscribers.
//! It is designed to be shared via `Arc<EventBus>` across the application.
//! Delivery is at-most-once: with no subscribers, or when a subscriber lags
//! past the buffer, events are dropped.

use carecall_core::alert::AlertChanged;
use carecall_core::ports::AlertNotifier;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use carecall_core::alert::{AlertChanged, AlertPriority, AlertStatus};
/// use carecall_events::EventBus;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(AlertChanged {
///     alert_id: 1,
///     new_status: AlertStatus::Pending,
///     priority: AlertPriority::High,
///     room_id: 12,
/// });
/// ```
pub struct EventBus {
    sender: broadcast::Sender<AlertChanged>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: AlertChanged) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<AlertChanged> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AlertNotifier for EventBus {
    fn publish(&self, event: AlertChanged) {
        EventBus::publish(self, event);
    }
}
