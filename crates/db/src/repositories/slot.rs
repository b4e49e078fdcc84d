use crate::models::{DbReservation, DbSlot};
use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use slotbook_core::models::{NewReservation, NewSlot};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const SLOT_COLUMNS: &str = "id, date_time, available, source_rule_id, reservation_id, created_at";

/// Insert result keyed by `(source_rule_id, date_time)`.
#[derive(Debug, Clone)]
pub enum InsertedSlot {
    Created(DbSlot),
    Existing(DbSlot),
}

/// Outcome of the conditional reservation write.
#[derive(Debug, Clone)]
pub enum ReservedSlot {
    Reserved(DbReservation),
    NotFound,
    Unavailable,
}

pub async fn insert_slot(pool: &Pool<Postgres>, input: &NewSlot) -> Result<InsertedSlot> {
    let inserted = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        INSERT INTO slots (id, date_time, available, source_rule_id, created_at)
        VALUES ($1, $2, TRUE, $3, $4)
        ON CONFLICT (source_rule_id, date_time) DO NOTHING
        RETURNING {SLOT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(input.date_time)
    .bind(input.source_rule_id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    if let Some(slot) = inserted {
        return Ok(InsertedSlot::Created(slot));
    }

    let existing = sqlx::query_as::<_, DbSlot>(&format!(
        "SELECT {SLOT_COLUMNS} FROM slots WHERE source_rule_id = $1 AND date_time = $2"
    ))
    .bind(input.source_rule_id)
    .bind(input.date_time)
    .fetch_optional(pool)
    .await?
    // The conflicting row can only vanish if its rule was deleted in between.
    .ok_or_else(|| eyre!("Slot insert conflicted but no existing slot was found"))?;

    Ok(InsertedSlot::Existing(existing))
}

pub async fn get_slot_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(&format!(
        "SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub async fn list_slots_between(
    pool: &Pool<Postgres>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM slots
        WHERE date_time >= $1 AND date_time <= $2
        ORDER BY date_time ASC
        "#
    ))
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

/// Creates the reservation and claims the slot in one transaction. The
/// slot update only matches while `available` is still true, so of two
/// concurrent callers exactly one sees a row affected.
pub async fn reserve_slot(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    input: &NewReservation,
) -> Result<ReservedSlot> {
    let mut tx = pool.begin().await?;

    let reservation = sqlx::query_as::<_, DbReservation>(
        r#"
        INSERT INTO reservations (id, slot_date_time, user_id, user_name, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, slot_date_time, user_id, user_name, status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(input.slot_date_time)
    .bind(&input.user_id)
    .bind(&input.user_name)
    .bind(input.status.as_str())
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    let claimed = sqlx::query(
        r#"
        UPDATE slots
        SET available = FALSE, reservation_id = $2
        WHERE id = $1 AND available = TRUE
        "#,
    )
    .bind(slot_id)
    .bind(reservation.id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if claimed == 0 {
        tx.rollback().await?;
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM slots WHERE id = $1)")
            .bind(slot_id)
            .fetch_one(pool)
            .await?;
        tracing::debug!("Slot claim matched no rows: id={}, exists={}", slot_id, exists);
        return Ok(if exists {
            ReservedSlot::Unavailable
        } else {
            ReservedSlot::NotFound
        });
    }

    tx.commit().await?;
    tracing::debug!("Slot reserved: id={}, reservation={}", slot_id, reservation.id);
    Ok(ReservedSlot::Reserved(reservation))
}
