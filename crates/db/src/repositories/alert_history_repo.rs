//! Repository for the append-only `alert_history` table.

use carecall_core::history::NewAlertHistory;
use carecall_core::types::DbId;
use sqlx::PgPool;

use crate::models::alert_history::AlertHistoryRow;

/// Column list for `alert_history` queries.
const COLUMNS: &str =
    "id, alert_id, staff_id, action, previous_status_id, new_status_id, notes, created_at";

/// Insert and read operations for alert history. There is no update or
/// delete; the table rejects both.
pub struct AlertHistoryRepo;

impl AlertHistoryRepo {
    /// Append an entry, returning the stored row.
    pub async fn append(
        pool: &PgPool,
        entry: &NewAlertHistory,
    ) -> Result<AlertHistoryRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert_history \
                (alert_id, staff_id, action, previous_status_id, new_status_id, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlertHistoryRow>(&query)
            .bind(entry.alert_id)
            .bind(entry.staff_id)
            .bind(&entry.action)
            .bind(entry.previous_status.map(|s| s.id()))
            .bind(entry.new_status.id())
            .bind(&entry.notes)
            .fetch_one(pool)
            .await
    }

    /// All entries for an alert, oldest first with insertion order as the
    /// tie-break.
    pub async fn list_for_alert(
        pool: &PgPool,
        alert_id: DbId,
    ) -> Result<Vec<AlertHistoryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alert_history \
             WHERE alert_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, AlertHistoryRow>(&query)
            .bind(alert_id)
            .fetch_all(pool)
            .await
    }
}
