//! Lookup-driven priority resolution.
//!
//! Patient directory failures never surface from here: the resolver logs
//! them and falls back to the no-context priority so an alert is never
//! blocked on the directory being reachable.

use std::sync::Arc;

use carecall_core::alert::{AlertPriority, AlertType};
use carecall_core::ports::PatientLookup;
use carecall_core::priority::{most_severe_patient, resolve_priority};
use carecall_core::types::DbId;

#[derive(Clone)]
pub struct PriorityResolver {
    patients: Arc<dyn PatientLookup>,
}

impl PriorityResolver {
    pub fn new(patients: Arc<dyn PatientLookup>) -> Self {
        Self { patients }
    }

    /// Resolve the priority for an alert about a single (optional) patient.
    pub async fn resolve(&self, alert_type: AlertType, patient_id: Option<DbId>) -> AlertPriority {
        let Some(patient_id) = patient_id else {
            return resolve_priority(alert_type, None);
        };
        if alert_type == AlertType::Emergency {
            return AlertPriority::Critical;
        }

        match self.patients.get_patient_by_id(patient_id).await {
            Ok(patient) => resolve_priority(alert_type, patient.map(|p| p.condition_level)),
            Err(e) => {
                tracing::warn!(
                    patient_id,
                    error = %e,
                    "Patient lookup failed, using fallback priority"
                );
                resolve_priority(alert_type, None)
            }
        }
    }

    /// Resolve the priority for a room-level alert using the most severe
    /// patient in the room. Also returns that patient's id, if any.
    pub async fn resolve_for_room(
        &self,
        alert_type: AlertType,
        room_id: DbId,
    ) -> (AlertPriority, Option<DbId>) {
        match self.patients.get_patients_by_room(room_id).await {
            Ok(patients) => {
                let most_severe = most_severe_patient(&patients);
                (
                    resolve_priority(alert_type, most_severe.map(|p| p.condition_level)),
                    most_severe.map(|p| p.id),
                )
            }
            Err(e) => {
                tracing::warn!(
                    room_id,
                    error = %e,
                    "Room patient lookup failed, using fallback priority"
                );
                (resolve_priority(alert_type, None), None)
            }
        }
    }
}
