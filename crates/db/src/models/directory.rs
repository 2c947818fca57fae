//! Patient, staff and device row models.

use carecall_core::directory::{Device, Patient, Staff};
use carecall_core::error::CoreError;
use carecall_core::priority::ConditionLevel;
use carecall_core::types::DbId;
use sqlx::FromRow;

/// A row from the `patients` table.
#[derive(Debug, Clone, FromRow)]
pub struct PatientRow {
    pub id: DbId,
    pub room_id: DbId,
    pub condition_level: String,
}

impl TryFrom<PatientRow> for Patient {
    type Error = CoreError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let condition_level = ConditionLevel::parse(&row.condition_level).ok_or_else(|| {
            CoreError::Internal(format!(
                "Patient {} has unknown condition level '{}'",
                row.id, row.condition_level
            ))
        })?;
        Ok(Patient {
            id: row.id,
            room_id: row.room_id,
            condition_level,
        })
    }
}

/// An on-duty staff member joined with their room assignment.
#[derive(Debug, Clone, FromRow)]
pub struct StaffRow {
    pub id: DbId,
    pub name: String,
}

impl From<StaffRow> for Staff {
    fn from(row: StaffRow) -> Self {
        Staff {
            id: row.id,
            name: row.name,
        }
    }
}

/// A row from the `devices` table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceRow {
    pub id: DbId,
    pub room_id: DbId,
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            id: row.id,
            room_id: row.room_id,
        }
    }
}
