//! Alert history row model.

use carecall_core::alert::AlertStatus;
use carecall_core::error::CoreError;
use carecall_core::history::AlertHistory;
use carecall_core::types::{DbId, StatusId, Timestamp};
use sqlx::FromRow;

/// A row from the `alert_history` table.
#[derive(Debug, Clone, FromRow)]
pub struct AlertHistoryRow {
    pub id: DbId,
    pub alert_id: DbId,
    pub staff_id: Option<DbId>,
    pub action: String,
    pub previous_status_id: Option<StatusId>,
    pub new_status_id: StatusId,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

fn status(id: StatusId, entry_id: DbId) -> Result<AlertStatus, CoreError> {
    AlertStatus::from_id(id).ok_or_else(|| {
        CoreError::Internal(format!("History entry {entry_id} has unknown status id {id}"))
    })
}

impl TryFrom<AlertHistoryRow> for AlertHistory {
    type Error = CoreError;

    fn try_from(row: AlertHistoryRow) -> Result<Self, Self::Error> {
        let previous_status = row
            .previous_status_id
            .map(|id| status(id, row.id))
            .transpose()?;
        let new_status = status(row.new_status_id, row.id)?;

        Ok(AlertHistory {
            id: row.id,
            alert_id: row.alert_id,
            staff_id: row.staff_id,
            action: row.action,
            previous_status,
            new_status,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}
