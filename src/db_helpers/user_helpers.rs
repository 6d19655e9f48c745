use sqlx::SqlitePool;

use crate::{
    authentication::{hash_password_argon2, random_oauth_password},
    data_formats::UserPageRequest,
    errors::RequestError,
    models::{AuthProvider, User},
};

use super::QueryBuilder;

const USER_COLUMNS: &str = "id, email, password, name, profile_image, auth_provider";

pub async fn insert_user(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
    profile_image: Option<&str>,
    provider: AuthProvider,
) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password, name, profile_image, auth_provider)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(profile_image)
    .bind(provider.as_str())
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Existing account for `email`, or a fresh Google account with an unusable password.
pub async fn find_or_create_oauth_user(
    pool: &SqlitePool,
    email: &str,
    name: Option<&str>,
    picture: Option<&str>,
) -> Result<User, RequestError> {
    if let Some(user) = get_user_by_email(pool, email).await? {
        return Ok(user);
    }
    let password = hash_password_argon2(random_oauth_password()).await?;
    let user = insert_user(pool, email, &password, name, picture, AuthProvider::Google).await?;
    tracing::info!(email, "created account from Google sign-in");
    Ok(user)
}

pub async fn search_users_by_name(
    pool: &SqlitePool,
    term: &str,
) -> Result<Vec<User>, RequestError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE name LIKE $1 ORDER BY name ASC, id ASC"
    ))
    .bind(format!("%{term}%"))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Name-or-email substring search, paged.
pub async fn search_users_in_db(
    pool: &SqlitePool,
    term: &str,
    request: &UserPageRequest,
) -> Result<(Vec<User>, i64), RequestError> {
    let pattern = format!("%{term}%");
    let mut tx = pool.begin().await?;
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE name LIKE $1 OR email LIKE $1")
            .bind(&pattern)
            .fetch_one(&mut tx)
            .await?;
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE name LIKE $1 OR email LIKE $1 ORDER BY {} LIMIT $2 OFFSET $3",
        request.order_by()
    ))
    .bind(&pattern)
    .bind(request.size)
    .bind(request.offset())
    .fetch_all(&mut tx)
    .await?;
    tx.commit().await?;
    Ok((users, total))
}

pub async fn users_by_initial_in_db(
    pool: &SqlitePool,
    initial: &str,
    request: &UserPageRequest,
) -> Result<(Vec<User>, i64), RequestError> {
    let pattern = format!("{initial}%");
    let mut tx = pool.begin().await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE name LIKE $1")
        .bind(&pattern)
        .fetch_one(&mut tx)
        .await?;
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE name LIKE $1 ORDER BY name ASC, id ASC LIMIT $2 OFFSET $3"
    ))
    .bind(&pattern)
    .bind(request.size)
    .bind(request.offset())
    .fetch_all(&mut tx)
    .await?;
    tx.commit().await?;
    Ok((users, total))
}

/// Profile fields to overwrite. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub auth_provider: Option<AuthProvider>,
    pub profile_image: Option<String>,
}

pub async fn update_user_in_db(
    pool: &SqlitePool,
    id: i64,
    ProfileUpdate {
        name,
        password_hash,
        auth_provider,
        profile_image,
    }: ProfileUpdate,
) -> Result<User, RequestError> {
    QueryBuilder::update("users")
        .add_param("name", name)
        .add_param("password", password_hash)
        .add_param(
            "auth_provider",
            auth_provider.map(|provider| provider.as_str().to_string()),
        )
        .add_param("profile_image", profile_image)
        .execute(pool, id)
        .await?;

    match get_user_by_id(pool, id).await? {
        Some(user) => Ok(user),
        None => Err(RequestError::NotFound("User not found")),
    }
}
