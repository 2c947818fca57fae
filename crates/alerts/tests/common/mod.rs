//! In-memory port implementations shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use carecall_alerts::{AlertService, Collaborators};
use carecall_core::alert::{urgency_order, Alert, AlertChanged, AlertStatus, NewAlert};
use carecall_core::directory::{Device, Patient, Staff};
use carecall_core::error::CoreError;
use carecall_core::history::{timeline_order, AlertHistory, NewAlertHistory};
use carecall_core::ports::{
    AlertNotifier, AlertStore, DeviceLookup, HistoryStore, PatientLookup, StaffDirectory,
};
use carecall_core::priority::ConditionLevel;
use carecall_core::requests::AlertQuery;
use carecall_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Alert store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryAlertStore {
    alerts: Mutex<Vec<Alert>>,
    /// When set, the next compare-and-swap behaves as if another writer
    /// committed first.
    interfere_next_swap: AtomicBool,
}

impl MemoryAlertStore {
    /// Shift an alert's creation time into the past.
    pub fn backdate(&self, alert_id: DbId, minutes: i64) {
        let mut alerts = self.alerts.lock().unwrap();
        let alert = alerts.iter_mut().find(|a| a.id == alert_id).unwrap();
        alert.created_at -= Duration::minutes(minutes);
    }

    /// Overwrite a stored alert, bypassing the version check.
    pub fn set(&self, alert: Alert) {
        let mut alerts = self.alerts.lock().unwrap();
        let stored = alerts.iter_mut().find(|a| a.id == alert.id).unwrap();
        *stored = alert;
    }

    pub fn interfere_next_swap(&self) {
        self.interfere_next_swap.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, alert_id: DbId) -> Alert {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn insert(&self, new: &NewAlert) -> Result<Alert, CoreError> {
        let mut alerts = self.alerts.lock().unwrap();
        let now = Utc::now();
        let alert = Alert {
            id: alerts.len() as DbId + 1,
            room_id: new.room_id,
            patient_id: new.patient_id,
            device_id: new.device_id,
            assigned_staff_id: None,
            resolved_by_staff_id: None,
            alert_type: new.alert_type,
            priority: new.priority,
            status: AlertStatus::Pending,
            message: new.message.clone(),
            detected_keywords: new.detected_keywords.clone(),
            audio_reference: new.audio_reference.clone(),
            escalation_count: 0,
            escalation_timeout_minutes: new.escalation_timeout_minutes,
            version: 0,
            created_at: now,
            acknowledged_at: None,
            resolved_at: None,
            updated_at: now,
        };
        alerts.push(alert.clone());
        Ok(alert)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Alert>, CoreError> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn compare_and_swap(&self, updated: &Alert, expected_version: i64) -> Result<bool, CoreError> {
        let mut alerts = self.alerts.lock().unwrap();
        let Some(stored) = alerts.iter_mut().find(|a| a.id == updated.id) else {
            return Ok(false);
        };
        if self.interfere_next_swap.swap(false, Ordering::SeqCst) {
            stored.version += 1;
        }
        if stored.version != expected_version {
            return Ok(false);
        }
        *stored = Alert {
            created_at: stored.created_at,
            ..updated.clone()
        };
        Ok(true)
    }

    async fn list(&self, query: &AlertQuery) -> Result<Vec<Alert>, CoreError> {
        let mut matching: Vec<Alert> = self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| query.room_id.map_or(true, |v| a.room_id == v))
            .filter(|a| query.patient_id.map_or(true, |v| a.patient_id == Some(v)))
            .filter(|a| query.staff_id.map_or(true, |v| a.assigned_staff_id == Some(v)))
            .filter(|a| query.alert_type.map_or(true, |v| a.alert_type == v))
            .filter(|a| query.priority.map_or(true, |v| a.priority == v))
            .filter(|a| query.status.map_or(true, |v| a.status == v))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect())
    }

    async fn list_active(&self, room_id: Option<DbId>) -> Result<Vec<Alert>, CoreError> {
        let mut active: Vec<Alert> = self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.status.is_active())
            .filter(|a| room_id.map_or(true, |r| a.room_id == r))
            .cloned()
            .collect();
        active.sort_by(urgency_order);
        Ok(active)
    }

    async fn find_overdue(&self, now: Timestamp, timeout_minutes: Option<i32>) -> Result<Vec<Alert>, CoreError> {
        let mut overdue: Vec<Alert> = self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.is_overdue(now, timeout_minutes))
            .cloned()
            .collect();
        overdue.sort_by(urgency_order);
        Ok(overdue)
    }
}

// ---------------------------------------------------------------------------
// History store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<AlertHistory>>,
    fail_appends: AtomicBool,
}

impl MemoryHistoryStore {
    pub fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    pub fn entries_for(&self, alert_id: DbId) -> Vec<AlertHistory> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.alert_id == alert_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, entry: &NewAlertHistory) -> Result<AlertHistory, CoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("history store unavailable".into()));
        }
        let mut entries = self.entries.lock().unwrap();
        let recorded = AlertHistory {
            id: entries.len() as DbId + 1,
            alert_id: entry.alert_id,
            staff_id: entry.staff_id,
            action: entry.action.clone(),
            previous_status: entry.previous_status,
            new_status: entry.new_status,
            notes: entry.notes.clone(),
            created_at: Utc::now(),
        };
        entries.push(recorded.clone());
        Ok(recorded)
    }

    async fn list_for_alert(&self, alert_id: DbId) -> Result<Vec<AlertHistory>, CoreError> {
        let mut timeline = self.entries_for(alert_id);
        timeline.sort_by(timeline_order);
        Ok(timeline)
    }
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryDirectory {
    patients: Mutex<Vec<Patient>>,
    /// room id -> on-duty staff in assignment order.
    on_duty: Mutex<HashMap<DbId, Vec<Staff>>>,
    /// (staff id, room id) pairs with an active assignment.
    assignments: Mutex<Vec<(DbId, DbId)>>,
    devices: Mutex<Vec<Device>>,
    fail_patient_lookups: AtomicBool,
    fail_staff_lookups: AtomicBool,
}

impl MemoryDirectory {
    pub fn add_patient(&self, id: DbId, room_id: DbId, condition_level: ConditionLevel) {
        self.patients.lock().unwrap().push(Patient {
            id,
            room_id,
            condition_level,
        });
    }

    /// Put a staff member on duty in a room. Also records the assignment.
    pub fn add_on_duty(&self, room_id: DbId, staff_id: DbId) {
        self.on_duty
            .lock()
            .unwrap()
            .entry(room_id)
            .or_default()
            .push(Staff {
                id: staff_id,
                name: format!("Nurse {staff_id}"),
            });
        self.assign(staff_id, room_id);
    }

    /// Record an assignment without putting the staff member on duty.
    pub fn assign(&self, staff_id: DbId, room_id: DbId) {
        self.assignments.lock().unwrap().push((staff_id, room_id));
    }

    pub fn add_device(&self, id: DbId, room_id: DbId) {
        self.devices.lock().unwrap().push(Device { id, room_id });
    }

    pub fn fail_patient_lookups(&self) {
        self.fail_patient_lookups.store(true, Ordering::SeqCst);
    }

    pub fn fail_staff_lookups(&self) {
        self.fail_staff_lookups.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PatientLookup for MemoryDirectory {
    async fn get_patient_by_id(&self, id: DbId) -> Result<Option<Patient>, CoreError> {
        if self.fail_patient_lookups.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("patient directory unavailable".into()));
        }
        Ok(self
            .patients
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn get_patients_by_room(&self, room_id: DbId) -> Result<Vec<Patient>, CoreError> {
        if self.fail_patient_lookups.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("patient directory unavailable".into()));
        }
        Ok(self
            .patients
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StaffDirectory for MemoryDirectory {
    async fn get_on_duty_staff_by_room(&self, room_id: DbId) -> Result<Vec<Staff>, CoreError> {
        if self.fail_staff_lookups.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("staff directory unavailable".into()));
        }
        Ok(self
            .on_duty
            .lock()
            .unwrap()
            .get(&room_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_staff_assigned_to_room(&self, staff_id: DbId, room_id: DbId) -> Result<bool, CoreError> {
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .contains(&(staff_id, room_id)))
    }
}

#[async_trait]
impl DeviceLookup for MemoryDirectory {
    async fn get_device(&self, id: DbId) -> Result<Option<Device>, CoreError> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<AlertChanged>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<AlertChanged> {
        self.events.lock().unwrap().clone()
    }
}

impl AlertNotifier for RecordingNotifier {
    fn publish(&self, event: AlertChanged) {
        self.events.lock().unwrap().push(event);
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A wired service plus handles to its in-memory collaborators.
pub struct Harness {
    pub service: AlertService,
    pub alerts: Arc<MemoryAlertStore>,
    pub history: Arc<MemoryHistoryStore>,
    pub directory: Arc<MemoryDirectory>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(RecordingNotifier::default()))
    }

    pub fn with_notifier(notifier: Arc<RecordingNotifier>) -> Self {
        let alerts = Arc::new(MemoryAlertStore::default());
        let history = Arc::new(MemoryHistoryStore::default());
        let directory = Arc::new(MemoryDirectory::default());

        let service = AlertService::new(Collaborators {
            alerts: alerts.clone(),
            history: history.clone(),
            patients: directory.clone(),
            staff: directory.clone(),
            devices: directory.clone(),
            notifier: notifier.clone(),
        });

        Self {
            service,
            alerts,
            history,
            directory,
            notifier,
        }
    }
}
