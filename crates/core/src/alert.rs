//! Alert lifecycle types and the alert state machine.
//!
//! Every status change goes through [`Alert::apply`], which validates the
//! requested [`Transition`] against the transition table in
//! [`valid_actions`] and returns the updated alert. Persisting the result
//! (with an optimistic version check) is the caller's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, StatusId, Timestamp};

// ---------------------------------------------------------------------------
// Lookup enums
// ---------------------------------------------------------------------------

/// Default minutes an alert may stay pending before it is escalated.
pub const DEFAULT_ESCALATION_TIMEOUT_MINUTES: i32 = 5;

macro_rules! define_alert_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant = $val ),+
        }

        impl $name {
            /// Every variant in database id order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Return the database lookup ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a database lookup ID back into the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// The wire/label form, e.g. `"in_progress"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        CoreError::Validation(format!(
                            "Invalid {} '{s}'. Must be one of: {}",
                            stringify!($name),
                            Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
                        ))
                    })
            }
        }
    };
}

define_alert_enum! {
    /// Where an alert came from.
    AlertType {
        VoiceCall = 1 => "voice_call",
        ButtonPress = 2 => "button_press",
        Emergency = 3 => "emergency",
        System = 4 => "system",
        Scheduled = 5 => "scheduled",
    }
}

define_alert_enum! {
    /// Urgency tier. The database id doubles as the sort weight, so
    /// `critical` (1) orders before `low` (4).
    AlertPriority {
        Critical = 1 => "critical",
        High = 2 => "high",
        Medium = 3 => "medium",
        Low = 4 => "low",
    }
}

define_alert_enum! {
    /// Alert lifecycle status.
    AlertStatus {
        Pending = 1 => "pending",
        Acknowledged = 2 => "acknowledged",
        InProgress = 3 => "in_progress",
        Resolved = 4 => "resolved",
        Cancelled = 5 => "cancelled",
        Escalated = 6 => "escalated",
    }
}

impl AlertType {
    /// Message used when a creation request carries a blank one.
    pub fn default_message(self) -> &'static str {
        match self {
            AlertType::VoiceCall => "Voice call for assistance",
            AlertType::ButtonPress => "Call button pressed",
            AlertType::Emergency => "Emergency alert",
            AlertType::System => "System alert",
            AlertType::Scheduled => "Scheduled check due",
        }
    }
}

impl AlertPriority {
    /// Sort weight: lower is more urgent.
    pub fn weight(self) -> i16 {
        self.id()
    }
}

impl AlertStatus {
    /// Statuses from which no further transition is possible.
    pub const TERMINAL: [AlertStatus; 2] = [AlertStatus::Resolved, AlertStatus::Cancelled];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    /// Still needs attention from staff.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// A state-changing operation on an existing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    Acknowledge,
    StartProgress,
    Resolve,
    Cancel,
    Escalate,
}

impl AlertAction {
    /// Verb form used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertAction::Acknowledge => "acknowledge",
            AlertAction::StartProgress => "start progress on",
            AlertAction::Resolve => "resolve",
            AlertAction::Cancel => "cancel",
            AlertAction::Escalate => "escalate",
        }
    }

    /// Status an alert lands in after this action.
    pub fn target_status(self) -> AlertStatus {
        match self {
            AlertAction::Acknowledge => AlertStatus::Acknowledged,
            AlertAction::StartProgress => AlertStatus::InProgress,
            AlertAction::Resolve => AlertStatus::Resolved,
            AlertAction::Cancel => AlertStatus::Cancelled,
            AlertAction::Escalate => AlertStatus::Escalated,
        }
    }

    /// Label written to the history trail.
    pub fn history_label(self) -> &'static str {
        match self {
            AlertAction::Acknowledge => crate::history::ACTION_ACKNOWLEDGED,
            AlertAction::StartProgress => crate::history::ACTION_IN_PROGRESS,
            AlertAction::Resolve => crate::history::ACTION_RESOLVED,
            AlertAction::Cancel => crate::history::ACTION_CANCELLED,
            AlertAction::Escalate => crate::history::ACTION_ESCALATED,
        }
    }
}

/// Returns the actions permitted while an alert is in `status`.
///
/// Transition rules:
/// - `pending`      -> acknowledge, resolve, cancel, escalate
/// - `escalated`    -> acknowledge, resolve, cancel
/// - `acknowledged` -> start progress, resolve, cancel
/// - `in_progress`  -> resolve, cancel
/// - `resolved`, `cancelled` -> nothing (terminal)
pub fn valid_actions(status: AlertStatus) -> &'static [AlertAction] {
    use AlertAction::*;
    match status {
        AlertStatus::Pending => &[Acknowledge, Resolve, Cancel, Escalate],
        AlertStatus::Escalated => &[Acknowledge, Resolve, Cancel],
        AlertStatus::Acknowledged => &[StartProgress, Resolve, Cancel],
        AlertStatus::InProgress => &[Resolve, Cancel],
        AlertStatus::Resolved | AlertStatus::Cancelled => &[],
    }
}

/// Validate `action` against the current status, returning the new status.
pub fn validate_transition(
    current: AlertStatus,
    action: AlertAction,
) -> Result<AlertStatus, CoreError> {
    if valid_actions(current).contains(&action) {
        Ok(action.target_status())
    } else {
        Err(CoreError::InvalidTransition {
            from: current.as_str(),
            action: action.as_str(),
        })
    }
}

/// A requested transition together with the data it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Acknowledge {
        staff_id: DbId,
    },
    StartProgress {
        staff_id: DbId,
    },
    Resolve {
        staff_id: DbId,
        notes: Option<String>,
    },
    Cancel {
        staff_id: DbId,
        reason: Option<String>,
    },
    /// `assign_to` is the staff member picked by escalation target
    /// selection; `triggered_by` is set only for manual escalations.
    Escalate {
        assign_to: Option<DbId>,
        triggered_by: Option<DbId>,
    },
}

impl Transition {
    pub fn action(&self) -> AlertAction {
        match self {
            Transition::Acknowledge { .. } => AlertAction::Acknowledge,
            Transition::StartProgress { .. } => AlertAction::StartProgress,
            Transition::Resolve { .. } => AlertAction::Resolve,
            Transition::Cancel { .. } => AlertAction::Cancel,
            Transition::Escalate { .. } => AlertAction::Escalate,
        }
    }

    /// Staff member recorded as the actor in the history trail.
    pub fn actor(&self) -> Option<DbId> {
        match self {
            Transition::Acknowledge { staff_id }
            | Transition::StartProgress { staff_id }
            | Transition::Resolve { staff_id, .. }
            | Transition::Cancel { staff_id, .. } => Some(*staff_id),
            Transition::Escalate { triggered_by, .. } => *triggered_by,
        }
    }

    /// Free-text notes recorded in the history trail.
    pub fn notes(&self) -> Option<String> {
        match self {
            Transition::Resolve { notes, .. } => notes.clone(),
            Transition::Cancel { reason, .. } => reason.clone(),
            Transition::Escalate {
                assign_to: Some(staff_id),
                ..
            } => Some(format!("Reassigned to staff {staff_id}")),
            Transition::Escalate {
                assign_to: None, ..
            } => Some("No eligible on-duty staff in room".to_string()),
            Transition::Acknowledge { .. } | Transition::StartProgress { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// An incident requiring staff attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub id: DbId,
    pub room_id: DbId,
    pub patient_id: Option<DbId>,
    pub device_id: Option<DbId>,
    pub assigned_staff_id: Option<DbId>,
    pub resolved_by_staff_id: Option<DbId>,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub status: AlertStatus,
    pub message: String,
    pub detected_keywords: Vec<String>,
    pub audio_reference: Option<String>,
    pub escalation_count: i32,
    pub escalation_timeout_minutes: i32,
    /// Optimistic concurrency marker, bumped on every committed change.
    pub version: i64,
    pub created_at: Timestamp,
    pub acknowledged_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl Alert {
    /// Apply `transition` at time `now`, returning the updated alert.
    ///
    /// The original is left untouched. The returned alert carries
    /// `version + 1`; persist it with a compare-and-swap against
    /// `self.version`.
    pub fn apply(&self, transition: &Transition, now: Timestamp) -> Result<Alert, CoreError> {
        let next = validate_transition(self.status, transition.action())?;

        let mut updated = self.clone();
        updated.status = next;
        updated.updated_at = now;
        updated.version = self.version + 1;

        match transition {
            Transition::Acknowledge { staff_id } => {
                updated.assigned_staff_id = Some(*staff_id);
                updated.acknowledged_at.get_or_insert(now);
            }
            Transition::StartProgress { .. } | Transition::Cancel { .. } => {}
            Transition::Resolve { staff_id, .. } => {
                updated.resolved_by_staff_id = Some(*staff_id);
                updated.resolved_at.get_or_insert(now);
            }
            Transition::Escalate { assign_to, .. } => {
                updated.escalation_count += 1;
                if let Some(staff_id) = assign_to {
                    updated.assigned_staff_id = Some(*staff_id);
                }
            }
        }

        Ok(updated)
    }

    /// Whether a pending alert has waited past its escalation window.
    ///
    /// `timeout_override` replaces the alert's own
    /// `escalation_timeout_minutes` when set.
    pub fn is_overdue(&self, now: Timestamp, timeout_override: Option<i32>) -> bool {
        let minutes = timeout_override.unwrap_or(self.escalation_timeout_minutes);
        self.status == AlertStatus::Pending
            && self.created_at < now - chrono::Duration::minutes(i64::from(minutes))
    }
}

/// Ordering used by every "active alerts" and overdue listing: priority
/// (critical first), then oldest first, then id.
pub fn urgency_order(a: &Alert, b: &Alert) -> std::cmp::Ordering {
    a.priority
        .weight()
        .cmp(&b.priority.weight())
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

/// Input for inserting a new alert. Status always starts at `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub room_id: DbId,
    pub patient_id: Option<DbId>,
    pub device_id: Option<DbId>,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub message: String,
    pub detected_keywords: Vec<String>,
    pub audio_reference: Option<String>,
    pub escalation_timeout_minutes: i32,
}

/// Payload published after every committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertChanged {
    pub alert_id: DbId,
    pub new_status: AlertStatus,
    pub priority: AlertPriority,
    pub room_id: DbId,
}

impl From<&Alert> for AlertChanged {
    fn from(alert: &Alert) -> Self {
        Self {
            alert_id: alert.id,
            new_status: alert.status,
            priority: alert.priority,
            room_id: alert.room_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
