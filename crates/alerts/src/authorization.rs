//! Room authorization gate.
//!
//! Answers whether a staff member is assigned to the room an alert belongs
//! to. No role-based bypass lives here; admin overrides belong to the
//! calling layer.

use std::sync::Arc;

use carecall_core::error::CoreError;
use carecall_core::ports::{AlertStore, StaffDirectory};
use carecall_core::types::DbId;

#[derive(Clone)]
pub struct RoomAuthorizationGate {
    alerts: Arc<dyn AlertStore>,
    staff: Arc<dyn StaffDirectory>,
}

impl RoomAuthorizationGate {
    pub fn new(alerts: Arc<dyn AlertStore>, staff: Arc<dyn StaffDirectory>) -> Self {
        Self { alerts, staff }
    }

    /// `true` if `staff_id` is assigned to the alert's room.
    ///
    /// Returns `NotFound` for an unknown alert. Has no side effects.
    pub async fn can_staff_handle_alert(
        &self,
        staff_id: DbId,
        alert_id: DbId,
    ) -> Result<bool, CoreError> {
        let alert = self
            .alerts
            .find_by_id(alert_id)
            .await?
            .ok_or(CoreError::alert_not_found(alert_id))?;

        self.staff
            .is_staff_assigned_to_room(staff_id, alert.room_id)
            .await
    }

    /// Like [`can_staff_handle_alert`](Self::can_staff_handle_alert) but
    /// turns a `false` answer into `Forbidden`.
    pub async fn require_room_access(&self, staff_id: DbId, alert_id: DbId) -> Result<(), CoreError> {
        if self.can_staff_handle_alert(staff_id, alert_id).await? {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "Staff {staff_id} is not assigned to the room of alert {alert_id}"
            )))
        }
    }
}
