//! Records returned by the patient, staff and device directories.

use serde::Serialize;

use crate::priority::ConditionLevel;
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patient {
    pub id: DbId,
    pub room_id: DbId,
    pub condition_level: ConditionLevel,
}

/// A staff member currently available and assigned to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Staff {
    pub id: DbId,
    pub name: String,
}

/// A bedside or room device able to raise alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: DbId,
    pub room_id: DbId,
}
