//! Integration tests for the alert and alert history repositories.
//!
//! Exercises the SQL the engine relies on against a real database:
//! - Version-guarded updates
//! - Overdue lookup with per-alert and uniform timeouts
//! - Active listing filter and urgency ordering
//! - History timeline ordering and append-only enforcement

use chrono::Duration;
use sqlx::PgPool;

use carecall_core::alert::{Alert, AlertPriority, AlertStatus, AlertType, NewAlert, Transition};
use carecall_core::history::{NewAlertHistory, ACTION_CREATED};
use carecall_core::types::DbId;
use carecall_db::repositories::{AlertHistoryRepo, AlertRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_alert(priority: AlertPriority, timeout_minutes: i32) -> NewAlert {
    NewAlert {
        room_id: 10,
        patient_id: None,
        device_id: None,
        alert_type: AlertType::ButtonPress,
        priority,
        message: "Call button pressed".to_string(),
        detected_keywords: vec!["help".to_string()],
        audio_reference: None,
        escalation_timeout_minutes: timeout_minutes,
    }
}

async fn insert(pool: &PgPool, priority: AlertPriority, timeout_minutes: i32) -> Alert {
    let row = AlertRepo::insert(pool, &new_alert(priority, timeout_minutes))
        .await
        .unwrap();
    Alert::try_from(row).unwrap()
}

async fn find(pool: &PgPool, id: DbId) -> Alert {
    let row = AlertRepo::find_by_id(pool, id).await.unwrap().unwrap();
    Alert::try_from(row).unwrap()
}

async fn commit(pool: &PgPool, alert: &Alert, transition: Transition) -> Alert {
    let updated = alert.apply(&transition, chrono::Utc::now()).unwrap();
    assert!(AlertRepo::update_if_version(pool, &updated, alert.version)
        .await
        .unwrap());
    updated
}

fn ids(rows: Vec<carecall_db::models::alert::AlertRow>) -> Vec<DbId> {
    rows.into_iter().map(|r| r.id).collect()
}

// ---------------------------------------------------------------------------
// Test: Insert defaults
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_starts_pending_at_version_zero(pool: PgPool) {
    let alert = insert(&pool, AlertPriority::High, 5).await;

    assert_eq!(alert.status, AlertStatus::Pending);
    assert_eq!(alert.version, 0);
    assert_eq!(alert.escalation_count, 0);
    assert_eq!(alert.detected_keywords, vec!["help".to_string()]);
}

// ---------------------------------------------------------------------------
// Test: Version-guarded update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stale_version_update_is_rejected(pool: PgPool) {
    let alert = insert(&pool, AlertPriority::Medium, 5).await;

    let escalated = commit(
        &pool,
        &alert,
        Transition::Escalate {
            assign_to: None,
            triggered_by: None,
        },
    )
    .await;
    assert_eq!(escalated.version, 1);

    // A writer still holding the version-0 copy loses.
    let stale = alert
        .apply(
            &Transition::Cancel {
                staff_id: 1,
                reason: None,
            },
            chrono::Utc::now(),
        )
        .unwrap();
    let applied = AlertRepo::update_if_version(&pool, &stale, alert.version)
        .await
        .unwrap();
    assert!(!applied);

    let stored = find(&pool, alert.id).await;
    assert_eq!(stored.status, AlertStatus::Escalated);
    assert_eq!(stored.version, 1);
    assert_eq!(stored.escalation_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_never_moves_created_at(pool: PgPool) {
    let alert = insert(&pool, AlertPriority::Low, 5).await;

    let mut moved = alert
        .apply(
            &Transition::Cancel {
                staff_id: 1,
                reason: None,
            },
            chrono::Utc::now(),
        )
        .unwrap();
    moved.created_at = alert.created_at - Duration::hours(1);
    assert!(AlertRepo::update_if_version(&pool, &moved, alert.version)
        .await
        .unwrap());

    let stored = find(&pool, alert.id).await;
    assert_eq!(stored.status, AlertStatus::Cancelled);
    assert_eq!(stored.created_at, alert.created_at);
}

// ---------------------------------------------------------------------------
// Test: Overdue lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_overdue_uses_each_alert_timeout(pool: PgPool) {
    let short = insert(&pool, AlertPriority::Medium, 5).await;
    let long = insert(&pool, AlertPriority::Medium, 30).await;
    let now = long.created_at + Duration::minutes(10);

    let overdue = ids(AlertRepo::find_overdue(&pool, now, None).await.unwrap());

    assert_eq!(overdue, vec![short.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_overdue_uniform_timeout_overrides(pool: PgPool) {
    let short = insert(&pool, AlertPriority::Low, 5).await;
    let long = insert(&pool, AlertPriority::Critical, 30).await;
    let now = long.created_at + Duration::minutes(2);

    let overdue = ids(AlertRepo::find_overdue(&pool, now, Some(1)).await.unwrap());
    assert_eq!(overdue, vec![long.id, short.id]);

    let none = AlertRepo::find_overdue(&pool, now, Some(60)).await.unwrap();
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_overdue_boundary_is_exclusive(pool: PgPool) {
    let alert = insert(&pool, AlertPriority::Medium, 5).await;

    let at_timeout = alert.created_at + Duration::minutes(5);
    assert!(AlertRepo::find_overdue(&pool, at_timeout, None)
        .await
        .unwrap()
        .is_empty());

    let past_timeout = at_timeout + Duration::seconds(1);
    assert_eq!(
        ids(AlertRepo::find_overdue(&pool, past_timeout, None).await.unwrap()),
        vec![alert.id]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_overdue_only_returns_pending(pool: PgPool) {
    let escalated = insert(&pool, AlertPriority::Medium, 5).await;
    let cancelled = insert(&pool, AlertPriority::Medium, 5).await;
    commit(
        &pool,
        &escalated,
        Transition::Escalate {
            assign_to: None,
            triggered_by: None,
        },
    )
    .await;
    commit(
        &pool,
        &cancelled,
        Transition::Cancel {
            staff_id: 1,
            reason: None,
        },
    )
    .await;

    let now = cancelled.created_at + Duration::hours(1);
    assert!(AlertRepo::find_overdue(&pool, now, None)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Test: Active listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_active_excludes_terminal_and_orders_by_urgency(pool: PgPool) {
    let low = insert(&pool, AlertPriority::Low, 5).await;
    let first_high = insert(&pool, AlertPriority::High, 5).await;
    let critical = insert(&pool, AlertPriority::Critical, 5).await;
    let second_high = insert(&pool, AlertPriority::High, 5).await;
    let cancelled = insert(&pool, AlertPriority::Critical, 5).await;
    let escalated = insert(&pool, AlertPriority::Medium, 5).await;

    commit(
        &pool,
        &cancelled,
        Transition::Cancel {
            staff_id: 1,
            reason: None,
        },
    )
    .await;
    commit(
        &pool,
        &escalated,
        Transition::Escalate {
            assign_to: None,
            triggered_by: None,
        },
    )
    .await;

    // Resolution needs a real staff row for the resolver FK.
    let (staff_id,): (DbId,) =
        sqlx::query_as("INSERT INTO staff (name, is_on_duty) VALUES ('Nurse Kim', true) RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    let resolved = insert(&pool, AlertPriority::Critical, 5).await;
    commit(
        &pool,
        &resolved,
        Transition::Resolve {
            staff_id,
            notes: None,
        },
    )
    .await;

    let active = ids(AlertRepo::list_active(&pool, None).await.unwrap());

    assert_eq!(
        active,
        vec![critical.id, first_high.id, second_high.id, escalated.id, low.id]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_active_filters_by_room(pool: PgPool) {
    let in_room = insert(&pool, AlertPriority::Low, 5).await;
    let mut other = new_alert(AlertPriority::Low, 5);
    other.room_id = 11;
    AlertRepo::insert(&pool, &other).await.unwrap();

    let room_10 = ids(AlertRepo::list_active(&pool, Some(10)).await.unwrap());

    assert_eq!(room_10, vec![in_room.id]);
}

// ---------------------------------------------------------------------------
// Test: History
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_timeline_orders_by_created_at_then_id(pool: PgPool) {
    let alert = insert(&pool, AlertPriority::Medium, 5).await;
    let stamp = alert.created_at;

    // Inserted out of chronological order, with a shared timestamp.
    let mut inserted = Vec::new();
    for (action, offset) in [("late", 10), ("early", 0), ("tied", 10)] {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO alert_history (alert_id, action, new_status_id, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(alert.id)
        .bind(action)
        .bind(AlertStatus::Pending.id())
        .bind(stamp + Duration::seconds(offset))
        .fetch_one(&pool)
        .await
        .unwrap();
        inserted.push(id);
    }

    let timeline: Vec<DbId> = AlertHistoryRepo::list_for_alert(&pool, alert.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(timeline, vec![inserted[1], inserted[0], inserted[2]]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_history_rejects_update_and_delete(pool: PgPool) {
    let alert = insert(&pool, AlertPriority::Medium, 5).await;
    let entry = AlertHistoryRepo::append(
        &pool,
        &NewAlertHistory {
            alert_id: alert.id,
            staff_id: None,
            action: ACTION_CREATED.to_string(),
            previous_status: None,
            new_status: AlertStatus::Pending,
            notes: None,
        },
    )
    .await
    .unwrap();

    let update = sqlx::query("UPDATE alert_history SET notes = 'edited' WHERE id = $1")
        .bind(entry.id)
        .execute(&pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM alert_history WHERE id = $1")
        .bind(entry.id)
        .execute(&pool)
        .await;
    assert!(delete.is_err());

    let timeline = AlertHistoryRepo::list_for_alert(&pool, alert.id).await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].notes, None);
}
