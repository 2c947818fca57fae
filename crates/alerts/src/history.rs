//! History recorder: one append per committed transition.
//!
//! The state change is already committed when the recorder runs, so an
//! append failure is logged as a warning and swallowed rather than returned.

use std::sync::Arc;

use carecall_core::alert::{Alert, Transition};
use carecall_core::error::CoreError;
use carecall_core::history::{AlertHistory, NewAlertHistory};
use carecall_core::ports::HistoryStore;
use carecall_core::types::DbId;

#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn HistoryStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Record the creation entry for a freshly inserted alert.
    pub async fn record_creation(
        &self,
        alert: &Alert,
        action: &str,
        staff_id: Option<DbId>,
    ) -> Option<AlertHistory> {
        self.append(NewAlertHistory {
            alert_id: alert.id,
            staff_id,
            action: action.to_string(),
            previous_status: None,
            new_status: alert.status,
            notes: None,
        })
        .await
    }

    /// Record a committed transition from `before` to `after`.
    pub async fn record_transition(
        &self,
        before: &Alert,
        after: &Alert,
        transition: &Transition,
    ) -> Option<AlertHistory> {
        self.append(NewAlertHistory {
            alert_id: after.id,
            staff_id: transition.actor(),
            action: transition.action().history_label().to_string(),
            previous_status: Some(before.status),
            new_status: after.status,
            notes: transition.notes(),
        })
        .await
    }

    /// The full timeline for an alert, oldest first.
    pub async fn timeline(&self, alert_id: DbId) -> Result<Vec<AlertHistory>, CoreError> {
        self.store.list_for_alert(alert_id).await
    }

    async fn append(&self, entry: NewAlertHistory) -> Option<AlertHistory> {
        match self.store.append(&entry).await {
            Ok(recorded) => Some(recorded),
            Err(e) => {
                tracing::warn!(
                    alert_id = entry.alert_id,
                    action = %entry.action,
                    error = %e,
                    "Failed to record alert history; state change stands"
                );
                None
            }
        }
    }
}
