use crate::models::DbAvailabilityRule;
use chrono::Utc;
use eyre::Result;
use slotbook_core::models::{AvailabilityRule, NewAvailabilityRule};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const RULE_COLUMNS: &str =
    "id, day_of_week, period, start_time, end_time, step_minutes, active, created_at";

pub async fn list_rules(pool: &Pool<Postgres>) -> Result<Vec<DbAvailabilityRule>> {
    let rules = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM availability_rules ORDER BY day_of_week ASC, start_time ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rules)
}

pub async fn list_active_rules(pool: &Pool<Postgres>, day_of_week: i16) -> Result<Vec<DbAvailabilityRule>> {
    let rules = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        r#"
        SELECT {RULE_COLUMNS}
        FROM availability_rules
        WHERE day_of_week = $1 AND active
        ORDER BY CASE period WHEN 'morning' THEN 0 ELSE 1 END, start_time ASC
        "#
    ))
    .bind(day_of_week)
    .fetch_all(pool)
    .await?;

    Ok(rules)
}

pub async fn get_rule_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbAvailabilityRule>> {
    let rule = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        "SELECT {RULE_COLUMNS} FROM availability_rules WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(rule)
}

pub async fn create_rule(pool: &Pool<Postgres>, input: &NewAvailabilityRule) -> Result<DbAvailabilityRule> {
    let rule = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        r#"
        INSERT INTO availability_rules
            (id, day_of_week, period, start_time, end_time, step_minutes, active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {RULE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(crate::models::day_to_db(input.day_of_week))
    .bind(input.period.as_str())
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(input.step_minutes)
    .bind(input.active)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    tracing::debug!("Availability rule created: id={}", rule.id);
    Ok(rule)
}

/// Writes every mutable column; `None` when the id does not exist.
pub async fn update_rule(pool: &Pool<Postgres>, rule: &AvailabilityRule) -> Result<Option<DbAvailabilityRule>> {
    let updated = sqlx::query_as::<_, DbAvailabilityRule>(&format!(
        r#"
        UPDATE availability_rules
        SET day_of_week = $2, period = $3, start_time = $4, end_time = $5,
            step_minutes = $6, active = $7
        WHERE id = $1
        RETURNING {RULE_COLUMNS}
        "#
    ))
    .bind(rule.id)
    .bind(crate::models::day_to_db(rule.day_of_week))
    .bind(rule.period.as_str())
    .bind(rule.start_time)
    .bind(rule.end_time)
    .bind(rule.step_minutes)
    .bind(rule.active)
    .fetch_optional(pool)
    .await?;

    Ok(updated)
}

pub async fn delete_rule(pool: &Pool<Postgres>, id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM availability_rules
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_active_weekdays(pool: &Pool<Postgres>) -> Result<Vec<i16>> {
    let days = sqlx::query_scalar::<_, i16>(
        r#"
        SELECT DISTINCT day_of_week
        FROM availability_rules
        WHERE active
        ORDER BY day_of_week ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(days)
}
