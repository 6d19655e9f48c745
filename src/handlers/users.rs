use std::{collections::HashMap, sync::Arc};

use axum::{extract::Path, extract::Query, Extension, Json};

use super::{store_image, JsonResult};
use crate::{
    authentication::{get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser},
    data_formats::{
        LoginRequest, RegisterRequest, RegisteredUser, RequestPayload, TokenResponse,
        UserPage, UserPageRequest, UserResponse,
    },
    db_helpers::{
        get_user_by_email, insert_user, search_users_by_name, search_users_in_db,
        update_user_in_db, users_by_initial_in_db, ProfileUpdate,
    },
    errors::RequestError,
    models::AuthProvider,
    services::send_welcome_email,
    state::AppContext,
};

const MIN_SEARCH_LEN: usize = 2;

// ----------------- Account Handlers -----------------
pub async fn register_user(
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(request): Json<RegisterRequest>,
) -> JsonResult<RegisteredUser> {
    let email = request.email.trim().to_string();
    if email.is_empty() || request.password.is_empty() {
        return Err(RequestError::bad_request("Email and password are required"));
    }
    let name = request
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let password_hash = hash_password_argon2(request.password).await?;
    let user = insert_user(
        &ctx.pool,
        &email,
        &password_hash,
        name.as_deref(),
        None,
        AuthProvider::Local,
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            RequestError::Conflict("Email already exists")
        } else {
            e
        }
    })?;
    let token = get_jwt_token(&ctx.config.jwt_secret, &user)?;
    tracing::info!(user_id = user.id, "registered new user");

    {
        let ctx = Arc::clone(&ctx);
        let to = user.email.clone();
        let greeting = user.name.clone().unwrap_or_else(|| user.email.clone());
        tokio::spawn(async move {
            send_welcome_email(ctx.mailer.as_ref(), &ctx.config.frontend_url, &to, &greeting).await;
        });
    }

    Ok(Json(RegisteredUser {
        user: user.into(),
        token,
    }))
}

pub async fn login_user(
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> JsonResult<TokenResponse> {
    let user = match get_user_by_email(&ctx.pool, request.email.trim()).await? {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found")),
    };
    if !verify_password_argon2(request.password, &user.password).await? {
        return Err(RequestError::NotAuthorized("Invalid password"));
    }
    let token = get_jwt_token(&ctx.config.jwt_secret, &user)?;
    Ok(Json(TokenResponse { token }))
}

// ----------------- Profile Handlers -----------------
pub async fn get_profile(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
) -> JsonResult<UserResponse> {
    match get_user_by_email(&ctx.pool, &principal.email).await? {
        Some(user) => Ok(Json(user.into())),
        None => Err(RequestError::NotFound("User not found")),
    }
}

/// Name, password and picture of the caller's own account. A password change on a local
/// account needs the current password; Google accounts set one freely and become local.
pub async fn update_profile(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    payload: RequestPayload,
) -> JsonResult<UserResponse> {
    let input = payload.into_profile_input();
    if let Some(email) = &input.email {
        if email.trim() != principal.email {
            return Err(RequestError::Forbidden("You can only update your own profile"));
        }
    }
    let user = match get_user_by_email(&ctx.pool, &principal.email).await? {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found")),
    };

    let mut update = ProfileUpdate {
        name: input.name,
        ..ProfileUpdate::default()
    };
    if let Some(password) = input.password {
        if user.provider() == AuthProvider::Local {
            let confirmed = match input.current_password {
                Some(current) => verify_password_argon2(current, &user.password).await?,
                None => false,
            };
            if !confirmed {
                return Err(RequestError::bad_request("Current password is incorrect"));
            }
        } else {
            update.auth_provider = Some(AuthProvider::Local);
        }
        update.password_hash = Some(hash_password_argon2(password).await?);
    }
    update.profile_image = store_image(&ctx, input.image).await?;

    let user = update_user_in_db(&ctx.pool, user.id, update).await?;
    Ok(Json(user.into()))
}

// ----------------- Directory Handlers -----------------
fn search_term(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|term| term.trim().to_string())
        .filter(|term| term.chars().count() >= MIN_SEARCH_LEN)
}

pub async fn list_users(
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult<Vec<UserResponse>> {
    let term = match search_term(&params, "search") {
        Some(term) => term,
        None => return Ok(Json(Vec::new())),
    };
    let users = search_users_by_name(&ctx.pool, &term).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn search_users(
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult<UserPage<UserResponse>> {
    let request = UserPageRequest::from_params(&params)?;
    let term = match search_term(&params, "query") {
        Some(term) => term,
        None => return Ok(Json(UserPage::new(Vec::new(), request.page, request.size, 0))),
    };
    let (users, total) = search_users_in_db(&ctx.pool, &term, &request).await?;
    Ok(Json(UserPage::new(
        users.into_iter().map(UserResponse::from).collect(),
        request.page,
        request.size,
        total,
    )))
}

pub async fn users_by_initial(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(initial): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult<UserPage<UserResponse>> {
    let initial = initial.trim();
    if initial.is_empty() {
        return Err(RequestError::bad_request("Initial letter is required"));
    }
    let request = UserPageRequest::from_params(&params)?;
    let (users, total) = users_by_initial_in_db(&ctx.pool, initial, &request).await?;
    Ok(Json(UserPage::new(
        users.into_iter().map(UserResponse::from).collect(),
        request.page,
        request.size,
        total,
    )))
}
