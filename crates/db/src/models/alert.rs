//! Alert row model.

use carecall_core::alert::{Alert, AlertPriority, AlertStatus, AlertType};
use carecall_core::error::CoreError;
use carecall_core::types::{DbId, StatusId, Timestamp};
use sqlx::FromRow;

/// A row from the `alerts` table.
#[derive(Debug, Clone, FromRow)]
pub struct AlertRow {
    pub id: DbId,
    pub room_id: DbId,
    pub patient_id: Option<DbId>,
    pub device_id: Option<DbId>,
    pub assigned_staff_id: Option<DbId>,
    pub resolved_by_staff_id: Option<DbId>,
    pub alert_type_id: StatusId,
    pub priority_id: StatusId,
    pub status_id: StatusId,
    pub message: String,
    pub detected_keywords: Vec<String>,
    pub audio_reference: Option<String>,
    pub escalation_count: i32,
    pub escalation_timeout_minutes: i32,
    pub version: i64,
    pub created_at: Timestamp,
    pub acknowledged_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

fn unknown_id(kind: &str, id: StatusId, alert_id: DbId) -> CoreError {
    CoreError::Internal(format!("Alert {alert_id} has unknown {kind} id {id}"))
}

impl TryFrom<AlertRow> for Alert {
    type Error = CoreError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let alert_type = AlertType::from_id(row.alert_type_id)
            .ok_or_else(|| unknown_id("alert type", row.alert_type_id, row.id))?;
        let priority = AlertPriority::from_id(row.priority_id)
            .ok_or_else(|| unknown_id("priority", row.priority_id, row.id))?;
        let status = AlertStatus::from_id(row.status_id)
            .ok_or_else(|| unknown_id("status", row.status_id, row.id))?;

        Ok(Alert {
            id: row.id,
            room_id: row.room_id,
            patient_id: row.patient_id,
            device_id: row.device_id,
            assigned_staff_id: row.assigned_staff_id,
            resolved_by_staff_id: row.resolved_by_staff_id,
            alert_type,
            priority,
            status,
            message: row.message,
            detected_keywords: row.detected_keywords,
            audio_reference: row.audio_reference,
            escalation_count: row.escalation_count,
            escalation_timeout_minutes: row.escalation_timeout_minutes,
            version: row.version,
            created_at: row.created_at,
            acknowledged_at: row.acknowledged_at,
            resolved_at: row.resolved_at,
            updated_at: row.updated_at,
        })
    }
}
