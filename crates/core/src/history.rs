//! Alert history trail entries.
//!
//! One entry is appended per committed transition. Entries are never
//! updated or deleted.

use serde::Serialize;

use crate::alert::AlertStatus;
use crate::types::{DbId, Timestamp};

/// Alert created by a staff request.
pub const ACTION_CREATED: &str = "created";
/// Alert created from a device signal.
pub const ACTION_CREATED_BY_DEVICE: &str = "created_by_device";
pub const ACTION_ACKNOWLEDGED: &str = "acknowledged";
pub const ACTION_IN_PROGRESS: &str = "in_progress";
pub const ACTION_RESOLVED: &str = "resolved";
pub const ACTION_CANCELLED: &str = "cancelled";
pub const ACTION_ESCALATED: &str = "escalated";

/// A committed history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertHistory {
    pub id: DbId,
    pub alert_id: DbId,
    /// `None` for scheduler- and device-driven transitions.
    pub staff_id: Option<DbId>,
    pub action: String,
    /// `None` only on the creation entry.
    pub previous_status: Option<AlertStatus>,
    pub new_status: AlertStatus,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

/// Input for appending a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlertHistory {
    pub alert_id: DbId,
    pub staff_id: Option<DbId>,
    pub action: String,
    pub previous_status: Option<AlertStatus>,
    pub new_status: AlertStatus,
    pub notes: Option<String>,
}

/// Chronological ordering for a timeline: `created_at`, then insertion
/// order (id).
pub fn timeline_order(a: &AlertHistory, b: &AlertHistory) -> std::cmp::Ordering {
    a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
}
