use sqlx::SqlitePool;

use crate::errors::RequestError;

pub async fn insert_contact_message_in_db(
    pool: &SqlitePool,
    name: Option<&str>,
    email: Option<&str>,
    message: Option<&str>,
) -> Result<i64, RequestError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO contact_messages (name, email, message)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(message)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
