use chrono::Utc;
use sqlx::SqlitePool;

use crate::{errors::RequestError, models::Comment};

const COMMENT_QUERY: &str = r#"
        SELECT comments.id          AS id,
               comments.content     AS content,
               comments.created_at  AS created_at,
               comments.post_id     AS post_id,
               comments.user_id     AS user_id,
               users.name           AS author_name,
               users.email          AS author_email,
               users.profile_image  AS author_image
        FROM   comments
               JOIN users
                 ON users.id = comments.user_id
"#;

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
    user_id: i64,
    content: &str,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;

    let post: Option<i64> = sqlx::query_scalar("SELECT id FROM blog_posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if post.is_none() {
        return Err(RequestError::NotFound("Post not found"));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO comments (content, created_at, post_id, user_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(content)
    .bind(Utc::now())
    .bind(post_id)
    .bind(user_id)
    .fetch_one(&mut tx)
    .await?;

    let comment = sqlx::query_as::<_, Comment>(&format!("{COMMENT_QUERY} WHERE comments.id = $1"))
        .bind(id)
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;

    Ok(comment)
}

/// Newest first.
pub async fn get_comments_from_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let comments = sqlx::query_as::<_, Comment>(&format!(
        "{COMMENT_QUERY} WHERE comments.post_id = $1 ORDER BY comments.created_at DESC, comments.id DESC"
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(comments)
}
