use std::sync::Arc;

use axum::{extract::Query, response::Redirect, Extension};
use url::Url;

use crate::{
    authentication::get_jwt_token,
    data_formats::OAuthCallbackQuery,
    db_helpers::find_or_create_oauth_user,
    errors::RequestError,
    state::AppContext,
};

/// `{frontend}{path}?{params}` with the parameters URL-encoded.
fn frontend_redirect(
    ctx: &AppContext,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Redirect, RequestError> {
    let base = format!("{}{}", ctx.config.frontend_url, path);
    let url = Url::parse_with_params(&base, params)
        .map_err(|e| RequestError::ServerError(anyhow::anyhow!("bad FRONTEND_URL: {e}")))?;
    Ok(Redirect::to(url.as_str()))
}

fn login_error(ctx: &AppContext, reason: &str) -> Result<Redirect, RequestError> {
    frontend_redirect(ctx, "/login", &[("error", reason)])
}

// ----------------- OAuth Handlers -----------------
pub async fn google_authorize(
    Extension(ctx): Extension<Arc<AppContext>>,
) -> Result<Redirect, RequestError> {
    match &ctx.google {
        Some(google) => Ok(Redirect::to(&google.authorize_url()?)),
        None => {
            tracing::warn!("Google sign-in requested but not configured");
            login_error(&ctx, "oauth_not_configured")
        }
    }
}

/// Completes the authorization-code flow and hands the frontend a token.
pub async fn google_callback(
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Redirect, RequestError> {
    let google = match &ctx.google {
        Some(google) => google,
        None => return login_error(&ctx, "oauth_not_configured"),
    };
    if let Some(error) = query.error {
        tracing::warn!("Google sign-in refused: {}", error);
        return login_error(&ctx, &error);
    }
    let code = match query.code {
        Some(code) => code,
        None => return login_error(&ctx, "auth_failed"),
    };

    let profile = match google.fetch_profile(&code).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("Google sign-in failed: {:#}", e);
            return login_error(&ctx, "auth_failed");
        }
    };
    let email = match profile.email.as_deref() {
        Some(email) if !email.is_empty() => email,
        _ => return login_error(&ctx, "email_missing"),
    };
    let user = match find_or_create_oauth_user(
        &ctx.pool,
        email,
        profile.name.as_deref(),
        profile.picture.as_deref(),
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Could not create account for {}: {}", email, e);
            return login_error(&ctx, "user_creation_failed");
        }
    };
    let token = get_jwt_token(&ctx.config.jwt_secret, &user)?;
    frontend_redirect(&ctx, "/oauth/callback", &[("token", token.as_str())])
}

pub async fn oauth_failure(
    Extension(ctx): Extension<Arc<AppContext>>,
) -> Result<Redirect, RequestError> {
    tracing::warn!("OAuth authentication failure reported");
    login_error(&ctx, "oauth_failure")
}
