use crate::models::DbReservation;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn get_reservation_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbReservation>> {
    let reservation = sqlx::query_as::<_, DbReservation>(
        r#"
        SELECT id, slot_date_time, user_id, user_name, status, created_at
        FROM reservations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(reservation)
}

pub async fn get_reservations_by_user(pool: &Pool<Postgres>, user_id: &str) -> Result<Vec<DbReservation>> {
    let reservations = sqlx::query_as::<_, DbReservation>(
        r#"
        SELECT id, slot_date_time, user_id, user_name, status, created_at
        FROM reservations
        WHERE user_id = $1
        ORDER BY slot_date_time ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(reservations)
}
