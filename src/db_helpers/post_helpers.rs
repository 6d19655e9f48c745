use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::data_formats::PageRequest;
use crate::errors::RequestError;
use crate::models::{CategoryCount, PostRecord};

use super::{record_query, DRAFTS_TABLE, POSTS_TABLE};

/// Restriction applied to a paged post listing.
#[derive(Debug, Clone, Copy)]
pub enum PostFilter<'a> {
    All,
    Category(&'a str),
    Author(i64),
}

/// Stored fields of a new post or draft.
#[derive(Debug)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Replacement fields of an update. A `None` category clears it; a `None` image keeps
/// the stored one.
#[derive(Debug)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

pub async fn list_all_posts_in_db(pool: &SqlitePool) -> Result<Vec<PostRecord>, RequestError> {
    let query = format!(
        "{} ORDER BY blog_posts.created_at DESC, blog_posts.id DESC",
        record_query(POSTS_TABLE)
    );
    let posts = sqlx::query_as::<_, PostRecord>(&query)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

/// One page of posts plus the total number matching `filter`.
pub async fn paginate_posts_in_db(
    pool: &SqlitePool,
    filter: PostFilter<'_>,
    request: &PageRequest,
) -> Result<(Vec<PostRecord>, i64), RequestError> {
    let condition = match filter {
        PostFilter::All => "",
        PostFilter::Category(_) => " WHERE blog_posts.category = $1",
        PostFilter::Author(_) => " WHERE blog_posts.user_id = $1",
    };
    let (limit, offset) = match filter {
        PostFilter::All => ("$1", "$2"),
        _ => ("$2", "$3"),
    };
    let count_query = format!("SELECT COUNT(*) FROM blog_posts{condition}");
    let page_query = format!(
        "{}{condition} ORDER BY {} LIMIT {limit} OFFSET {offset}",
        record_query(POSTS_TABLE),
        request.order_by(POSTS_TABLE)
    );

    let mut count = sqlx::query_scalar::<_, i64>(&count_query);
    let mut page = sqlx::query_as::<_, PostRecord>(&page_query);
    match filter {
        PostFilter::All => {}
        PostFilter::Category(category) => {
            count = count.bind(category);
            page = page.bind(category);
        }
        PostFilter::Author(user_id) => {
            count = count.bind(user_id);
            page = page.bind(user_id);
        }
    }

    let mut tx = pool.begin().await?;
    let total = count.fetch_one(&mut tx).await?;
    let posts = page
        .bind(request.size)
        .bind(request.offset())
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok((posts, total))
}

/// Posts grouped by category, optionally filtered by a case-insensitive substring.
/// The total is the number of distinct categories, not rows on this page.
pub async fn category_counts_in_db(
    pool: &SqlitePool,
    search: Option<&str>,
    request: &PageRequest,
) -> Result<(Vec<CategoryCount>, i64), RequestError> {
    let pattern = search.map(|term| format!("%{}%", term.to_lowercase()));
    let mut tx = pool.begin().await?;
    let distinct: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM (
            SELECT DISTINCT category FROM blog_posts
            WHERE ($1 IS NULL OR LOWER(category) LIKE $1)
        )
        "#,
    )
    .bind(pattern.as_deref())
    .fetch_one(&mut tx)
    .await?;
    let rows = sqlx::query_as::<_, CategoryCount>(
        r#"
        SELECT category AS name, COUNT(category) AS count
        FROM   blog_posts
        WHERE  ($1 IS NULL OR LOWER(category) LIKE $1)
        GROUP  BY category
        ORDER  BY category ASC
        LIMIT  $2 OFFSET $3
        "#,
    )
    .bind(pattern.as_deref())
    .bind(request.size)
    .bind(request.offset())
    .fetch_all(&mut tx)
    .await?;
    tx.commit().await?;
    Ok((rows, distinct))
}

pub async fn get_post_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<PostRecord>, RequestError> {
    get_record(pool, POSTS_TABLE, id).await
}

pub(super) async fn get_record(
    pool: &SqlitePool,
    table: &str,
    id: i64,
) -> Result<Option<PostRecord>, RequestError> {
    let query = format!("{} WHERE {table}.id = $1", record_query(table));
    let record = sqlx::query_as::<_, PostRecord>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

/// Inserts into the posts table when `published`, otherwise into drafts.
pub async fn create_post_in_db(
    pool: &SqlitePool,
    post: NewPost,
    published: bool,
) -> Result<PostRecord, RequestError> {
    let table = if published { POSTS_TABLE } else { DRAFTS_TABLE };
    let mut tx = pool.begin().await?;
    let id: i64 = sqlx::query_scalar(&format!(
        r#"
        INSERT INTO {table} (title, content, category, image_url, created_at, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#
    ))
    .bind(post.title)
    .bind(post.content)
    .bind(post.category)
    .bind(post.image_url)
    .bind(post.created_at)
    .bind(post.user_id)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    get_record(pool, table, id)
        .await?
        .ok_or(RequestError::NotFound("Post not found"))
}

pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    changes: PostChanges,
) -> Result<PostRecord, RequestError> {
    update_record(pool, POSTS_TABLE, id, changes, "Post not found").await
}

pub(super) async fn update_record(
    pool: &SqlitePool,
    table: &str,
    id: i64,
    PostChanges {
        title,
        content,
        category,
        image_url,
    }: PostChanges,
    missing: &'static str,
) -> Result<PostRecord, RequestError> {
    sqlx::query(&format!(
        r#"
        UPDATE {table}
        SET    title = $1,
               content = $2,
               category = $3,
               image_url = COALESCE($4, image_url)
        WHERE  id = $5
        "#
    ))
    .bind(title)
    .bind(content)
    .bind(category)
    .bind(image_url)
    .bind(id)
    .execute(pool)
    .await?;
    get_record(pool, table, id)
        .await?
        .ok_or(RequestError::NotFound(missing))
}

/// Removes the post and its comments together.
pub async fn delete_post_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM comments WHERE post_id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM blog_posts WHERE id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Single-statement increment. Unknown ids are silently ignored and a counter at
/// `i64::MAX` stays there.
pub async fn increment_views_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    sqlx::query("UPDATE blog_posts SET views = views + 1 WHERE id = $1 AND views < $2")
        .bind(id)
        .bind(i64::MAX)
        .execute(pool)
        .await?;
    Ok(())
}

/// Adds `amount` claps. Unknown ids are ignored; an addition past `i64::MAX` is
/// rejected, since SQLite would otherwise store the counter as a float.
pub async fn increment_claps_in_db(
    pool: &SqlitePool,
    id: i64,
    amount: i64,
) -> Result<(), RequestError> {
    let result = sqlx::query(
        "UPDATE blog_posts SET claps = claps + $1 WHERE id = $2 AND claps <= $3 - $1",
    )
    .bind(amount)
    .bind(id)
    .bind(i64::MAX)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 && get_post_in_db(pool, id).await?.is_some() {
        return Err(RequestError::bad_request("Clap count is too large"));
    }
    Ok(())
}

/// The `limit` most recently created posts, newest first.
pub async fn recent_posts_in_db(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<PostRecord>, RequestError> {
    let query = format!(
        "{} ORDER BY blog_posts.created_at DESC, blog_posts.id DESC LIMIT $1",
        record_query(POSTS_TABLE)
    );
    let posts = sqlx::query_as::<_, PostRecord>(&query)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}
