//! Capability interfaces consumed by the alert engine.
//!
//! The engine is constructed from trait objects implementing these; the
//! Postgres implementations live in `carecall-db`, the event bus in
//! `carecall-events`.

use async_trait::async_trait;

use crate::alert::{Alert, AlertChanged, NewAlert};
use crate::directory::{Device, Patient, Staff};
use crate::error::CoreError;
use crate::history::{AlertHistory, NewAlertHistory};
use crate::requests::AlertQuery;
use crate::types::{DbId, Timestamp};

#[async_trait]
pub trait PatientLookup: Send + Sync {
    async fn get_patient_by_id(&self, id: DbId) -> Result<Option<Patient>, CoreError>;

    /// Patients in a room, in directory order.
    async fn get_patients_by_room(&self, room_id: DbId) -> Result<Vec<Patient>, CoreError>;
}

#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Staff currently on duty and assigned to `room_id`, in a stable order.
    async fn get_on_duty_staff_by_room(&self, room_id: DbId) -> Result<Vec<Staff>, CoreError>;

    async fn is_staff_assigned_to_room(&self, staff_id: DbId, room_id: DbId)
        -> Result<bool, CoreError>;
}

#[async_trait]
pub trait DeviceLookup: Send + Sync {
    async fn get_device(&self, id: DbId) -> Result<Option<Device>, CoreError>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Insert a new alert in `pending` status with version 0.
    async fn insert(&self, alert: &NewAlert) -> Result<Alert, CoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Alert>, CoreError>;

    /// Persist `updated` only if the stored version still equals
    /// `expected_version`. Returns `false` when another writer got there
    /// first.
    async fn compare_and_swap(&self, updated: &Alert, expected_version: i64)
        -> Result<bool, CoreError>;

    /// Filtered, paginated listing, newest first.
    async fn list(&self, query: &AlertQuery) -> Result<Vec<Alert>, CoreError>;

    /// Alerts not yet resolved or cancelled, optionally for one room,
    /// ordered by priority then ascending creation time.
    async fn list_active(&self, room_id: Option<DbId>) -> Result<Vec<Alert>, CoreError>;

    /// Pending alerts past their escalation window at `now`, ordered by
    /// priority then ascending creation time. `timeout_minutes` replaces
    /// each alert's own timeout when set.
    async fn find_overdue(
        &self,
        now: Timestamp,
        timeout_minutes: Option<i32>,
    ) -> Result<Vec<Alert>, CoreError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: &NewAlertHistory) -> Result<AlertHistory, CoreError>;

    /// All entries for an alert in chronological order.
    async fn list_for_alert(&self, alert_id: DbId) -> Result<Vec<AlertHistory>, CoreError>;
}

/// Outbound sink for [`AlertChanged`] events.
///
/// Delivery is best effort: implementations must not block and may drop
/// events.
pub trait AlertNotifier: Send + Sync {
    fn publish(&self, event: AlertChanged);
}
