use std::sync::Arc;

use axum::{extract::Query, http::StatusCode, Extension, Json};

use crate::{
    data_formats::EmailQuery,
    errors::StatusEnvelope,
    newsletter::{self, dispatch_newsletter},
    state::AppContext,
    JsonResponse,
};

type StatusResult = Result<Json<StatusEnvelope>, JsonResponse<StatusEnvelope>>;

fn required_email(query: EmailQuery) -> Result<String, JsonResponse<StatusEnvelope>> {
    match query.email.map(|email| email.trim().to_string()) {
        Some(email) if !email.is_empty() => Ok(email),
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(StatusEnvelope::failed("Email is required")),
        )),
    }
}

// ----------------- Newsletter Handlers -----------------
pub async fn subscribe(
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(query): Query<EmailQuery>,
) -> StatusResult {
    let email = required_email(query)?;
    newsletter::subscribe(
        &ctx.pool,
        ctx.mailer.as_ref(),
        &ctx.config.frontend_url,
        &email,
    )
    .await
    .map_err(|e| e.to_status_envelope())?;
    Ok(Json(StatusEnvelope::ok(
        "Successfully subscribed to the newsletter",
    )))
}

pub async fn unsubscribe(
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(query): Query<EmailQuery>,
) -> StatusResult {
    let email = required_email(query)?;
    newsletter::unsubscribe(&ctx.pool, &email)
        .await
        .map_err(|e| e.to_status_envelope())?;
    Ok(Json(StatusEnvelope::ok(
        "Successfully unsubscribed from the newsletter",
    )))
}

/// Manual dispatcher run. Takes no lock; overlapping with a scheduled run can double-send.
pub async fn send_test_newsletter(Extension(ctx): Extension<Arc<AppContext>>) -> StatusResult {
    let report = dispatch_newsletter(&ctx)
        .await
        .map_err(|e| e.to_status_envelope())?;
    if report.posts == 0 {
        return Ok(Json(StatusEnvelope::ok("No posts to send in newsletter")));
    }
    Ok(Json(StatusEnvelope::ok("Newsletter sent successfully")))
}
