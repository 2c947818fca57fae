//! Inbound request DTOs and their validation rules.

use serde::Deserialize;
use validator::Validate;

use crate::alert::{AlertPriority, AlertStatus, AlertType};
use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length for an alert message (characters).
pub const MAX_MESSAGE_LENGTH: u64 = 2_000;

/// Maximum number of keywords a device may attach to one alert.
pub const MAX_DETECTED_KEYWORDS: u64 = 32;

/// Maximum length of an audio reference.
pub const MAX_AUDIO_REFERENCE_LENGTH: u64 = 1_024;

/// Bounds for a per-alert escalation timeout override (minutes).
pub const MIN_ESCALATION_TIMEOUT_MINUTES: i32 = 1;
pub const MAX_ESCALATION_TIMEOUT_MINUTES: i32 = 120;

/// Default page size for alert listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for alert listings.
pub const MAX_LIMIT: i64 = 100;

/// A staff-initiated alert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAlert {
    pub alert_type: AlertType,
    #[validate(range(min = 1, message = "room_id is required"))]
    pub room_id: DbId,
    pub patient_id: Option<DbId>,
    /// Overrides automatic priority resolution when present.
    pub priority: Option<AlertPriority>,
    #[validate(length(max = 2000, message = "message exceeds 2000 characters"))]
    #[serde(default)]
    pub message: String,
    #[validate(range(min = 1, max = 120))]
    pub escalation_timeout_minutes: Option<i32>,
    /// Staff member raising the alert, recorded in the history trail.
    pub created_by: Option<DbId>,
}

/// An alert raised by a room device (voice detection, call button).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDeviceAlert {
    #[validate(range(min = 1, message = "device_id is required"))]
    pub device_id: DbId,
    pub alert_type: AlertType,
    #[validate(length(max = 32, message = "too many detected keywords"))]
    #[serde(default)]
    pub detected_keywords: Vec<String>,
    #[validate(length(max = 1024))]
    pub audio_reference: Option<String>,
    #[validate(length(max = 2000, message = "message exceeds 2000 characters"))]
    #[serde(default)]
    pub message: String,
    #[validate(range(min = 1, max = 120))]
    pub escalation_timeout_minutes: Option<i32>,
}

/// Filters for `list_alerts`. All filters are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertQuery {
    pub room_id: Option<DbId>,
    pub patient_id: Option<DbId>,
    /// Matches the currently assigned staff member.
    pub staff_id: Option<DbId>,
    pub alert_type: Option<AlertType>,
    pub priority: Option<AlertPriority>,
    pub status: Option<AlertStatus>,
    /// Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Defaults to 0.
    pub offset: Option<i64>,
}

impl AlertQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Run `validator` rules and convert failures into [`CoreError::Validation`].
pub fn validate_request<T: Validate>(request: &T) -> Result<(), CoreError> {
    request
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))
}

/// Trim a message, substituting the type's default text when blank.
pub fn normalize_message(message: &str, alert_type: AlertType) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        alert_type.default_message().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Drop blank keywords and surrounding whitespace, keeping order.
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
