//! Structured logging of alert change events.
//!
//! [`EventLogger`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes one log line per [`AlertChanged`]. It runs as a long-lived
//! background task and shuts down when the bus sender is dropped.

use carecall_core::alert::{AlertChanged, AlertPriority};
use tokio::sync::broadcast;

/// Background consumer that logs every alert change.
pub struct EventLogger;

impl EventLogger {
    /// Run the logging loop.
    ///
    /// Returns the number of events logged once the channel is closed
    /// (i.e. the [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(mut receiver: broadcast::Receiver<AlertChanged>) -> u64 {
        let mut logged = 0u64;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    Self::log(&event);
                    logged += 1;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some alert changes were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(logged, "Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
        logged
    }

    fn log(event: &AlertChanged) {
        if event.priority == AlertPriority::Critical {
            tracing::warn!(
                alert_id = event.alert_id,
                room_id = event.room_id,
                status = %event.new_status,
                priority = %event.priority,
                "Critical alert changed"
            );
        } else {
            tracing::info!(
                alert_id = event.alert_id,
                room_id = event.room_id,
                status = %event.new_status,
                priority = %event.priority,
                "Alert changed"
            );
        }
    }
}
