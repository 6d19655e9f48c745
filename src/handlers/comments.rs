use std::sync::Arc;

use axum::{extract::Path, Extension, Json};

use super::{parse_id, JsonResult};
use crate::{
    authentication::AuthUser,
    data_formats::{CommentRequest, CommentResponse},
    db_helpers::{add_comment_to_post_in_db, get_comments_from_post_in_db, get_user_by_email},
    errors::RequestError,
    state::AppContext,
};

// ----------------- Comment Handlers -----------------
pub async fn get_comments(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(id): Path<String>,
) -> JsonResult<Vec<CommentResponse>> {
    let comments = get_comments_from_post_in_db(&ctx.pool, parse_id(&id)?).await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

pub async fn add_comment(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> JsonResult<CommentResponse> {
    let post_id = parse_id(&id)?;
    let content = match request.content {
        Some(content) if !content.trim().is_empty() => content,
        _ => return Err(RequestError::bad_request("Comment content must not be empty")),
    };
    let user = match get_user_by_email(&ctx.pool, &principal.email).await? {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found")),
    };
    let comment = add_comment_to_post_in_db(&ctx.pool, post_id, user.id, &content).await?;
    Ok(Json(comment.into()))
}
