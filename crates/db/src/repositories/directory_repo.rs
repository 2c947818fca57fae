//! Read-only repositories for the `patients`, `staff`,
//! `staff_room_assignments` and `devices` tables.

use carecall_core::types::DbId;
use sqlx::PgPool;

use crate::models::directory::{DeviceRow, PatientRow, StaffRow};

/// Column list for `patients` queries.
const PATIENT_COLUMNS: &str = "id, room_id, condition_level";

pub struct PatientRepo;

impl PatientRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PatientRow>, sqlx::Error> {
        let query = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Patients in a room, ordered by id so "first encountered" is stable.
    pub async fn list_by_room(pool: &PgPool, room_id: DbId) -> Result<Vec<PatientRow>, sqlx::Error> {
        let query =
            format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE room_id = $1 ORDER BY id");
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }
}

pub struct StaffRepo;

impl StaffRepo {
    /// On-duty staff with an active assignment to `room_id`, in assignment
    /// order.
    pub async fn list_on_duty_by_room(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<StaffRow>, sqlx::Error> {
        sqlx::query_as::<_, StaffRow>(
            "SELECT s.id, s.name \
             FROM staff s \
             JOIN staff_room_assignments sra ON sra.staff_id = s.id \
             WHERE sra.room_id = $1 AND sra.is_active AND s.is_on_duty \
             ORDER BY sra.created_at ASC, s.id ASC",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
    }

    /// Whether `staff_id` holds an active assignment to `room_id`.
    pub async fn is_assigned_to_room(
        pool: &PgPool,
        staff_id: DbId,
        room_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS( \
                 SELECT 1 FROM staff_room_assignments \
                 WHERE staff_id = $1 AND room_id = $2 AND is_active \
             )",
        )
        .bind(staff_id)
        .bind(room_id)
        .fetch_one(pool)
        .await
    }
}

pub struct DeviceRepo;

impl DeviceRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DeviceRow>, sqlx::Error> {
        sqlx::query_as::<_, DeviceRow>("SELECT id, room_id FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
