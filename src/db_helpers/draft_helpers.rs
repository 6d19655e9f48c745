use sqlx::SqlitePool;

use crate::errors::RequestError;
use crate::models::PostRecord;

use super::post_helpers::{get_record, update_record};
use super::{record_query, PostChanges, DRAFTS_TABLE, POSTS_TABLE};

pub async fn get_draft_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<PostRecord>, RequestError> {
    get_record(pool, DRAFTS_TABLE, id).await
}

pub async fn list_drafts_by_user_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<PostRecord>, RequestError> {
    let query = format!(
        "{} WHERE draft_posts.user_id = $1 ORDER BY draft_posts.created_at DESC, draft_posts.id DESC",
        record_query(DRAFTS_TABLE)
    );
    let drafts = sqlx::query_as::<_, PostRecord>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(drafts)
}

pub async fn update_draft_in_db(
    pool: &SqlitePool,
    id: i64,
    changes: PostChanges,
) -> Result<PostRecord, RequestError> {
    update_record(pool, DRAFTS_TABLE, id, changes, "Draft not found").await
}

pub async fn delete_draft_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    sqlx::query("DELETE FROM draft_posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Moves a draft into the published table in one transaction. The new post keeps the
/// draft's content, image, author and creation time; its counters start at zero.
pub async fn publish_draft_in_db(
    pool: &SqlitePool,
    draft_id: i64,
) -> Result<PostRecord, RequestError> {
    let mut tx = pool.begin().await?;
    let post_id: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO blog_posts (title, content, category, image_url, views, claps, created_at, user_id)
        SELECT title, content, category, image_url, 0, 0, created_at, user_id
        FROM   draft_posts
        WHERE  id = $1
        RETURNING id
        "#,
    )
    .bind(draft_id)
    .fetch_optional(&mut tx)
    .await?;
    let post_id = match post_id {
        Some(id) => id,
        None => return Err(RequestError::NotFound("Draft not found")),
    };
    sqlx::query("DELETE FROM draft_posts WHERE id = $1")
        .bind(draft_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;

    get_record(pool, POSTS_TABLE, post_id)
        .await?
        .ok_or(RequestError::NotFound("Post not found"))
}
