use crate::models::DbUser;
use eyre::Result;
use sqlx::{Pool, Postgres};

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: &str) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, name, email
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
