//! Alert lifecycle service.
//!
//! Every mutating operation follows the same path: load the alert, apply
//! the transition to a copy, commit it with a version compare-and-swap,
//! then append history and publish a change event. Only the commit is
//! allowed to fail the operation once the transition is valid.

use std::sync::Arc;

use chrono::Utc;

use carecall_core::alert::{
    validate_transition, Alert, AlertAction, AlertChanged, NewAlert, Transition,
    DEFAULT_ESCALATION_TIMEOUT_MINUTES,
};
use carecall_core::error::CoreError;
use carecall_core::escalation::select_escalation_target;
use carecall_core::history::{AlertHistory, ACTION_CREATED, ACTION_CREATED_BY_DEVICE};
use carecall_core::ports::{
    AlertNotifier, AlertStore, DeviceLookup, HistoryStore, PatientLookup, StaffDirectory,
};
use carecall_core::requests::{
    normalize_keywords, normalize_message, validate_request, AlertQuery, CreateAlert,
    CreateDeviceAlert,
};
use carecall_core::types::DbId;

use crate::authorization::RoomAuthorizationGate;
use crate::history::HistoryRecorder;
use crate::priority::PriorityResolver;

/// The collaborators an [`AlertService`] is wired with.
pub struct Collaborators {
    pub alerts: Arc<dyn AlertStore>,
    pub history: Arc<dyn HistoryStore>,
    pub patients: Arc<dyn PatientLookup>,
    pub staff: Arc<dyn StaffDirectory>,
    pub devices: Arc<dyn DeviceLookup>,
    pub notifier: Arc<dyn AlertNotifier>,
}

/// Result of a committed escalation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalation {
    pub alert: Alert,
    /// Staff member the alert was handed to. `None` when nobody eligible
    /// was on duty in the room.
    pub reassigned_to: Option<DbId>,
}

#[derive(Clone)]
pub struct AlertService {
    alerts: Arc<dyn AlertStore>,
    staff: Arc<dyn StaffDirectory>,
    devices: Arc<dyn DeviceLookup>,
    notifier: Arc<dyn AlertNotifier>,
    priority: PriorityResolver,
    history: HistoryRecorder,
    gate: RoomAuthorizationGate,
}

impl AlertService {
    pub fn new(deps: Collaborators) -> Self {
        Self {
            priority: PriorityResolver::new(deps.patients),
            history: HistoryRecorder::new(deps.history),
            gate: RoomAuthorizationGate::new(Arc::clone(&deps.alerts), Arc::clone(&deps.staff)),
            alerts: deps.alerts,
            staff: deps.staff,
            devices: deps.devices,
            notifier: deps.notifier,
        }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a staff-initiated alert.
    ///
    /// An explicit `priority` wins; otherwise it is resolved from the
    /// alert type and the patient's condition.
    pub async fn create_alert(&self, input: CreateAlert) -> Result<Alert, CoreError> {
        validate_request(&input)?;

        let priority = match input.priority {
            Some(priority) => priority,
            None => self.priority.resolve(input.alert_type, input.patient_id).await,
        };

        let alert = self
            .alerts
            .insert(&NewAlert {
                room_id: input.room_id,
                patient_id: input.patient_id,
                device_id: None,
                alert_type: input.alert_type,
                priority,
                message: normalize_message(&input.message, input.alert_type),
                detected_keywords: Vec::new(),
                audio_reference: None,
                escalation_timeout_minutes: input
                    .escalation_timeout_minutes
                    .unwrap_or(DEFAULT_ESCALATION_TIMEOUT_MINUTES),
            })
            .await?;

        self.history
            .record_creation(&alert, ACTION_CREATED, input.created_by)
            .await;
        self.notify(&alert);

        tracing::info!(
            alert_id = alert.id,
            room_id = alert.room_id,
            alert_type = %alert.alert_type,
            priority = %alert.priority,
            created_by = ?input.created_by,
            "Alert created"
        );
        Ok(alert)
    }

    /// Create an alert raised by a room device.
    ///
    /// The room comes from the device. Priority is resolved from the most
    /// severe patient in that room, who also becomes the alert's patient.
    pub async fn create_alert_from_device(&self, input: CreateDeviceAlert) -> Result<Alert, CoreError> {
        validate_request(&input)?;

        let device = self
            .devices
            .get_device(input.device_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Device",
                id: input.device_id,
            })?;

        let (priority, patient_id) = self
            .priority
            .resolve_for_room(input.alert_type, device.room_id)
            .await;

        let alert = self
            .alerts
            .insert(&NewAlert {
                room_id: device.room_id,
                patient_id,
                device_id: Some(device.id),
                alert_type: input.alert_type,
                priority,
                message: normalize_message(&input.message, input.alert_type),
                detected_keywords: normalize_keywords(&input.detected_keywords),
                audio_reference: input.audio_reference,
                escalation_timeout_minutes: input
                    .escalation_timeout_minutes
                    .unwrap_or(DEFAULT_ESCALATION_TIMEOUT_MINUTES),
            })
            .await?;

        self.history
            .record_creation(&alert, ACTION_CREATED_BY_DEVICE, None)
            .await;
        self.notify(&alert);

        tracing::info!(
            alert_id = alert.id,
            room_id = alert.room_id,
            device_id = device.id,
            alert_type = %alert.alert_type,
            priority = %alert.priority,
            keywords = alert.detected_keywords.len(),
            "Device alert created"
        );
        Ok(alert)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    pub async fn acknowledge(&self, alert_id: DbId, staff_id: DbId) -> Result<Alert, CoreError> {
        self.transition(alert_id, Transition::Acknowledge { staff_id })
            .await
    }

    pub async fn start_progress(&self, alert_id: DbId, staff_id: DbId) -> Result<Alert, CoreError> {
        self.transition(alert_id, Transition::StartProgress { staff_id })
            .await
    }

    pub async fn resolve(
        &self,
        alert_id: DbId,
        staff_id: DbId,
        notes: Option<String>,
    ) -> Result<Alert, CoreError> {
        self.transition(alert_id, Transition::Resolve { staff_id, notes })
            .await
    }

    pub async fn cancel(
        &self,
        alert_id: DbId,
        staff_id: DbId,
        reason: Option<String>,
    ) -> Result<Alert, CoreError> {
        self.transition(alert_id, Transition::Cancel { staff_id, reason })
            .await
    }

    /// Escalate an alert immediately, outside the scheduler.
    pub async fn escalate_now(
        &self,
        alert_id: DbId,
        triggered_by: Option<DbId>,
    ) -> Result<Escalation, CoreError> {
        self.escalate(alert_id, triggered_by).await
    }

    /// Shared escalation path for manual and scheduled escalation.
    ///
    /// Picks the first on-duty staff member in the room who is not the
    /// current assignee. With nobody eligible the alert is still escalated
    /// and the assignee is left unchanged.
    pub(crate) async fn escalate(
        &self,
        alert_id: DbId,
        triggered_by: Option<DbId>,
    ) -> Result<Escalation, CoreError> {
        let current = self.load(alert_id).await?;
        validate_transition(current.status, AlertAction::Escalate)?;

        let on_duty = self.staff.get_on_duty_staff_by_room(current.room_id).await?;
        let assign_to = select_escalation_target(&on_duty, current.assigned_staff_id);
        if assign_to.is_none() {
            tracing::warn!(
                alert_id,
                room_id = current.room_id,
                "No eligible on-duty staff, escalating without reassignment"
            );
        }

        let alert = self
            .commit(
                current,
                Transition::Escalate {
                    assign_to,
                    triggered_by,
                },
            )
            .await?;

        Ok(Escalation {
            alert,
            reassigned_to: assign_to,
        })
    }

    async fn transition(&self, alert_id: DbId, transition: Transition) -> Result<Alert, CoreError> {
        let current = self.load(alert_id).await?;
        self.commit(current, transition).await
    }

    async fn commit(&self, current: Alert, transition: Transition) -> Result<Alert, CoreError> {
        let updated = current.apply(&transition, Utc::now())?;

        if !self
            .alerts
            .compare_and_swap(&updated, current.version)
            .await?
        {
            tracing::warn!(
                alert_id = current.id,
                action = transition.action().as_str(),
                expected_version = current.version,
                "Alert modified concurrently, transition rejected"
            );
            return Err(CoreError::Conflict(format!(
                "Alert {} was modified concurrently",
                current.id
            )));
        }

        self.history
            .record_transition(&current, &updated, &transition)
            .await;
        self.notify(&updated);

        tracing::info!(
            alert_id = updated.id,
            from = %current.status,
            to = %updated.status,
            staff_id = ?transition.actor(),
            escalation_count = updated.escalation_count,
            "Alert transitioned"
        );
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn get_alert(&self, alert_id: DbId) -> Result<Alert, CoreError> {
        self.load(alert_id).await
    }

    /// Filtered, paginated listing, newest first.
    pub async fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>, CoreError> {
        self.alerts.list(query).await
    }

    /// Every non-terminal alert, most urgent first.
    pub async fn get_active_alerts(&self) -> Result<Vec<Alert>, CoreError> {
        self.alerts.list_active(None).await
    }

    pub async fn get_active_alerts_by_room(&self, room_id: DbId) -> Result<Vec<Alert>, CoreError> {
        self.alerts.list_active(Some(room_id)).await
    }

    /// Timeline for an alert, oldest first.
    pub async fn get_alert_history(&self, alert_id: DbId) -> Result<Vec<AlertHistory>, CoreError> {
        self.load(alert_id).await?;
        self.history.timeline(alert_id).await
    }

    /// Pending alerts past their escalation window, most urgent first.
    ///
    /// `timeout_minutes` replaces each alert's own timeout when set.
    pub async fn find_overdue(&self, timeout_minutes: Option<i32>) -> Result<Vec<Alert>, CoreError> {
        self.alerts.find_overdue(Utc::now(), timeout_minutes).await
    }

    // -----------------------------------------------------------------------
    // Authorization
    // -----------------------------------------------------------------------

    pub async fn can_staff_handle_alert(
        &self,
        staff_id: DbId,
        alert_id: DbId,
    ) -> Result<bool, CoreError> {
        self.gate.can_staff_handle_alert(staff_id, alert_id).await
    }

    pub async fn require_room_access(&self, staff_id: DbId, alert_id: DbId) -> Result<(), CoreError> {
        self.gate.require_room_access(staff_id, alert_id).await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn load(&self, alert_id: DbId) -> Result<Alert, CoreError> {
        self.alerts
            .find_by_id(alert_id)
            .await?
            .ok_or(CoreError::alert_not_found(alert_id))
    }

    fn notify(&self, alert: &Alert) {
        self.notifier.publish(AlertChanged::from(alert));
    }
}
