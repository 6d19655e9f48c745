use std::sync::Arc;

use axum::{
    http::{StatusCode, Uri},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    authentication::MaybeUser,
    data_formats::{AuthStatusResponse, AuthStatusUser, ContactRequest},
    db_helpers::insert_contact_message_in_db,
    errors::{ErrorMessage, RequestError},
    state::AppContext,
    JsonResponse,
};

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "SmartBlog backend is running!",
    }))
}

pub async fn not_found(uri: Uri) -> JsonResponse<ErrorMessage> {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorMessage::new(format!("URL {} provided was not found", uri))),
    )
}

// ----------------- Contact Handlers -----------------
pub async fn submit_contact_form(
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(request): Json<ContactRequest>,
) -> Result<String, RequestError> {
    insert_contact_message_in_db(
        &ctx.pool,
        request.name.as_deref(),
        request.email.as_deref(),
        request.message.as_deref(),
    )
    .await?;
    Ok(format!(
        "Message received successfully from: {}",
        request.name.as_deref().unwrap_or_default()
    ))
}

// ----------------- Debug Handlers -----------------
pub async fn auth_status(MaybeUser(principal): MaybeUser) -> Json<AuthStatusResponse> {
    Json(match principal {
        Some(principal) => AuthStatusResponse {
            authenticated: true,
            auth_type: "JWT".to_string(),
            user_info: Some(AuthStatusUser {
                email: principal.email,
                name: principal.name,
                user_id: principal.id,
            }),
        },
        None => AuthStatusResponse {
            authenticated: false,
            auth_type: "None".to_string(),
            user_info: None,
        },
    })
}
