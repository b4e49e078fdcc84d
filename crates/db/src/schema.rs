use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Recurring weekly windows
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_rules (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            day_of_week SMALLINT NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            period VARCHAR(16) NOT NULL CHECK (period IN ('morning', 'afternoon')),
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            step_minutes INTEGER NOT NULL CHECK (step_minutes > 0),
            active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_rule_window CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            slot_date_time TIMESTAMP WITH TIME ZONE NOT NULL,
            user_id VARCHAR(255) NOT NULL,
            user_name VARCHAR(255) NOT NULL,
            status VARCHAR(16) NOT NULL CHECK (status IN ('pending', 'confirmed', 'cancelled')),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // A slot is taken exactly when it points at a reservation.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            date_time TIMESTAMP WITH TIME ZONE NOT NULL,
            available BOOLEAN NOT NULL DEFAULT TRUE,
            source_rule_id UUID NULL REFERENCES availability_rules(id) ON DELETE SET NULL,
            reservation_id UUID NULL UNIQUE REFERENCES reservations(id),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT slot_reservation_consistent CHECK (available = (reservation_id IS NULL))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Contact directory used for booking notifications
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id VARCHAR(255) PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_slots_rule_date_time ON slots(source_rule_id, date_time)",
        "CREATE INDEX IF NOT EXISTS idx_slots_date_time ON slots(date_time)",
        "CREATE INDEX IF NOT EXISTS idx_availability_rules_day ON availability_rules(day_of_week) WHERE active",
        "CREATE INDEX IF NOT EXISTS idx_reservations_user_id ON reservations(user_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
