//! Postgres implementations of the `carecall_core::ports` traits.
//!
//! Thin wrappers over the repositories: they convert rows into core types
//! and map `sqlx::Error` into [`CoreError`].

use async_trait::async_trait;
use carecall_core::alert::{Alert, NewAlert};
use carecall_core::directory::{Device, Patient, Staff};
use carecall_core::error::CoreError;
use carecall_core::history::{AlertHistory, NewAlertHistory};
use carecall_core::ports::{
    AlertStore, DeviceLookup, HistoryStore, PatientLookup, StaffDirectory,
};
use carecall_core::requests::AlertQuery;
use carecall_core::types::{DbId, Timestamp};

use crate::models::alert::AlertRow;
use crate::repositories::{AlertHistoryRepo, AlertRepo, DeviceRepo, PatientRepo, StaffRepo};
use crate::DbPool;

/// Map a database failure into the engine's error taxonomy.
///
/// Storage failures are unrelated to business rules, so everything becomes
/// `Internal`; the original error is logged here because the message handed
/// upward is sanitized.
fn db_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::Internal("database operation failed".to_string())
}

fn into_alerts(rows: Vec<AlertRow>) -> Result<Vec<Alert>, CoreError> {
    rows.into_iter().map(Alert::try_from).collect()
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgAlertStore {
    pool: DbPool,
}

impl PgAlertStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn insert(&self, alert: &NewAlert) -> Result<Alert, CoreError> {
        let row = AlertRepo::insert(&self.pool, alert).await.map_err(db_error)?;
        Alert::try_from(row)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Alert>, CoreError> {
        AlertRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_error)?
            .map(Alert::try_from)
            .transpose()
    }

    async fn compare_and_swap(
        &self,
        updated: &Alert,
        expected_version: i64,
    ) -> Result<bool, CoreError> {
        AlertRepo::update_if_version(&self.pool, updated, expected_version)
            .await
            .map_err(db_error)
    }

    async fn list(&self, query: &AlertQuery) -> Result<Vec<Alert>, CoreError> {
        into_alerts(AlertRepo::list(&self.pool, query).await.map_err(db_error)?)
    }

    async fn list_active(&self, room_id: Option<DbId>) -> Result<Vec<Alert>, CoreError> {
        into_alerts(
            AlertRepo::list_active(&self.pool, room_id)
                .await
                .map_err(db_error)?,
        )
    }

    async fn find_overdue(
        &self,
        now: Timestamp,
        timeout_minutes: Option<i32>,
    ) -> Result<Vec<Alert>, CoreError> {
        into_alerts(
            AlertRepo::find_overdue(&self.pool, now, timeout_minutes)
                .await
                .map_err(db_error)?,
        )
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgHistoryStore {
    pool: DbPool,
}

impl PgHistoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn append(&self, entry: &NewAlertHistory) -> Result<AlertHistory, CoreError> {
        let row = AlertHistoryRepo::append(&self.pool, entry)
            .await
            .map_err(db_error)?;
        AlertHistory::try_from(row)
    }

    async fn list_for_alert(&self, alert_id: DbId) -> Result<Vec<AlertHistory>, CoreError> {
        AlertHistoryRepo::list_for_alert(&self.pool, alert_id)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(AlertHistory::try_from)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgPatientDirectory {
    pool: DbPool,
}

impl PgPatientDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientLookup for PgPatientDirectory {
    async fn get_patient_by_id(&self, id: DbId) -> Result<Option<Patient>, CoreError> {
        PatientRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_error)?
            .map(Patient::try_from)
            .transpose()
    }

    async fn get_patients_by_room(&self, room_id: DbId) -> Result<Vec<Patient>, CoreError> {
        PatientRepo::list_by_room(&self.pool, room_id)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Patient::try_from)
            .collect()
    }
}

#[derive(Clone)]
pub struct PgStaffDirectory {
    pool: DbPool,
}

impl PgStaffDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffDirectory for PgStaffDirectory {
    async fn get_on_duty_staff_by_room(&self, room_id: DbId) -> Result<Vec<Staff>, CoreError> {
        let rows = StaffRepo::list_on_duty_by_room(&self.pool, room_id)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Staff::from).collect())
    }

    async fn is_staff_assigned_to_room(
        &self,
        staff_id: DbId,
        room_id: DbId,
    ) -> Result<bool, CoreError> {
        StaffRepo::is_assigned_to_room(&self.pool, staff_id, room_id)
            .await
            .map_err(db_error)
    }
}

#[derive(Clone)]
pub struct PgDeviceDirectory {
    pool: DbPool,
}

impl PgDeviceDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceLookup for PgDeviceDirectory {
    async fn get_device(&self, id: DbId) -> Result<Option<Device>, CoreError> {
        let row = DeviceRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_error)?;
        Ok(row.map(Device::from))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn every_database_error_is_internal() {
        assert_matches!(db_error(sqlx::Error::RowNotFound), CoreError::Internal(_));
        assert_matches!(db_error(sqlx::Error::PoolTimedOut), CoreError::Internal(_));
    }

    #[test]
    fn internal_message_hides_driver_details() {
        let err = db_error(sqlx::Error::Protocol("password authentication failed".into()));
        assert_eq!(err.to_string(), "Internal error: database operation failed");
    }
}
