//! Repository for the `alerts` table.
//!
//! Status, priority and type are stored as SMALLINT lookup ids. Every
//! status change goes through [`AlertRepo::update_if_version`]; nothing here
//! writes `status_id` unconditionally.

use carecall_core::alert::{Alert, AlertStatus, NewAlert};
use carecall_core::requests::AlertQuery;
use carecall_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::alert::AlertRow;

/// Column list for `alerts` queries.
const COLUMNS: &str = "\
    id, room_id, patient_id, device_id, assigned_staff_id, resolved_by_staff_id, \
    alert_type_id, priority_id, status_id, message, detected_keywords, audio_reference, \
    escalation_count, escalation_timeout_minutes, version, \
    created_at, acknowledged_at, resolved_at, updated_at";

/// Urgency ordering shared by the active and overdue listings.
const URGENCY_ORDER: &str = "ORDER BY priority_id ASC, created_at ASC, id ASC";

/// Provides insert, conditional update and query operations for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Insert a new alert in `pending` status, returning the created row.
    pub async fn insert(pool: &PgPool, input: &NewAlert) -> Result<AlertRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO alerts \
                (room_id, patient_id, device_id, alert_type_id, priority_id, status_id, \
                 message, detected_keywords, audio_reference, escalation_timeout_minutes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(input.room_id)
            .bind(input.patient_id)
            .bind(input.device_id)
            .bind(input.alert_type.id())
            .bind(input.priority.id())
            .bind(AlertStatus::Pending.id())
            .bind(&input.message)
            .bind(&input.detected_keywords)
            .bind(&input.audio_reference)
            .bind(input.escalation_timeout_minutes)
            .fetch_one(pool)
            .await
    }

    /// Find an alert by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AlertRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM alerts WHERE id = $1");
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Write the mutable lifecycle columns of `alert`, but only if the row
    /// still carries `expected_version`.
    ///
    /// Returns `true` if the row was updated, `false` if another writer
    /// changed it since it was read. `created_at` is never written.
    pub async fn update_if_version(
        pool: &PgPool,
        alert: &Alert,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE alerts \
             SET status_id = $3, assigned_staff_id = $4, resolved_by_staff_id = $5, \
                 escalation_count = $6, acknowledged_at = $7, resolved_at = $8, \
                 updated_at = $9, version = $10 \
             WHERE id = $1 AND version = $2",
        )
        .bind(alert.id)
        .bind(expected_version)
        .bind(alert.status.id())
        .bind(alert.assigned_staff_id)
        .bind(alert.resolved_by_staff_id)
        .bind(alert.escalation_count)
        .bind(alert.acknowledged_at)
        .bind(alert.resolved_at)
        .bind(alert.updated_at)
        .bind(alert.version)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List alerts matching the optional filters, newest first.
    pub async fn list(pool: &PgPool, params: &AlertQuery) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE ($1::BIGINT IS NULL OR room_id = $1) \
               AND ($2::BIGINT IS NULL OR patient_id = $2) \
               AND ($3::BIGINT IS NULL OR assigned_staff_id = $3) \
               AND ($4::SMALLINT IS NULL OR alert_type_id = $4) \
               AND ($5::SMALLINT IS NULL OR priority_id = $5) \
               AND ($6::SMALLINT IS NULL OR status_id = $6) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $7 OFFSET $8"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(params.room_id)
            .bind(params.patient_id)
            .bind(params.staff_id)
            .bind(params.alert_type.map(|t| t.id()))
            .bind(params.priority.map(|p| p.id()))
            .bind(params.status.map(|s| s.id()))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
    }

    /// List alerts that are neither resolved nor cancelled, optionally for a
    /// single room, most urgent first.
    pub async fn list_active(
        pool: &PgPool,
        room_id: Option<DbId>,
    ) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE status_id NOT IN ($1, $2) \
               AND ($3::BIGINT IS NULL OR room_id = $3) \
             {URGENCY_ORDER}"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(AlertStatus::TERMINAL[0].id())
            .bind(AlertStatus::TERMINAL[1].id())
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// List pending alerts created at least `timeout_minutes` before `now`.
    ///
    /// When `timeout_minutes` is `None` each alert's own
    /// `escalation_timeout_minutes` applies.
    pub async fn find_overdue(
        pool: &PgPool,
        now: Timestamp,
        timeout_minutes: Option<i32>,
    ) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE status_id = $1 \
               AND created_at < $2 - make_interval(mins => COALESCE($3::INTEGER, escalation_timeout_minutes)) \
             {URGENCY_ORDER}"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(AlertStatus::Pending.id())
            .bind(now)
            .bind(timeout_minutes)
            .fetch_all(pool)
            .await
    }
}
