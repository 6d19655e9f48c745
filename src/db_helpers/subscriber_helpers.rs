use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{errors::RequestError, models::Subscriber};

const SUBSCRIBER_COLUMNS: &str = "id, email, active, subscribed_at, last_email_sent";

pub async fn get_subscriber_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<Subscriber>, RequestError> {
    let subscriber = sqlx::query_as::<_, Subscriber>(&format!(
        "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(subscriber)
}

pub async fn insert_subscriber_in_db(
    pool: &SqlitePool,
    email: &str,
) -> Result<Subscriber, RequestError> {
    let subscriber = sqlx::query_as::<_, Subscriber>(&format!(
        r#"
        INSERT INTO subscribers (email, active, subscribed_at)
        VALUES ($1, 1, $2)
        RETURNING {SUBSCRIBER_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(subscriber)
}

pub async fn set_subscriber_active_in_db(
    pool: &SqlitePool,
    id: i64,
    active: bool,
) -> Result<(), RequestError> {
    sqlx::query("UPDATE subscribers SET active = $1 WHERE id = $2")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn active_subscribers_in_db(pool: &SqlitePool) -> Result<Vec<Subscriber>, RequestError> {
    let subscribers = sqlx::query_as::<_, Subscriber>(&format!(
        "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE active = 1 ORDER BY id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(subscribers)
}

pub async fn stamp_last_email_sent_in_db(
    pool: &SqlitePool,
    id: i64,
    sent_at: DateTime<Utc>,
) -> Result<(), RequestError> {
    sqlx::query("UPDATE subscribers SET last_email_sent = $1 WHERE id = $2")
        .bind(sent_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
