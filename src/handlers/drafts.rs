use std::sync::Arc;

use axum::{extract::Path, Extension, Json};

use super::{parse_id, store_image, JsonResult};
use crate::{
    authentication::AuthUser,
    data_formats::{PostResponse, RequestPayload},
    db_helpers::{
        delete_draft_in_db, get_draft_in_db, get_user_by_email, list_drafts_by_user_in_db,
        publish_draft_in_db, update_draft_in_db, PostChanges,
    },
    errors::RequestError,
    models::PostRecord,
    ownership::ensure_can_mutate,
    state::AppContext,
};

async fn load_draft(ctx: &AppContext, id: &str) -> Result<PostRecord, RequestError> {
    match get_draft_in_db(&ctx.pool, parse_id(id)?).await? {
        Some(draft) => Ok(draft),
        None => Err(RequestError::NotFound("Draft not found")),
    }
}

// ----------------- Draft Handlers -----------------
/// Drafts are private: only their author may list them.
pub async fn get_drafts_by_user(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    Path(email): Path<String>,
) -> JsonResult<Vec<PostResponse>> {
    if principal.email != email {
        return Err(RequestError::Forbidden("You can only view your own drafts."));
    }
    let user = match get_user_by_email(&ctx.pool, &email).await? {
        Some(user) => user,
        None => return Ok(Json(Vec::new())),
    };
    let drafts = list_drafts_by_user_in_db(&ctx.pool, user.id).await?;
    Ok(Json(drafts.into_iter().map(PostResponse::draft).collect()))
}

pub async fn get_draft(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    Path(id): Path<String>,
) -> JsonResult<PostResponse> {
    let draft = load_draft(&ctx, &id).await?;
    ensure_can_mutate(&principal, &draft, "You can only view your own drafts.")?;
    Ok(Json(PostResponse::draft(draft)))
}

pub async fn publish_draft(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    Path(id): Path<String>,
) -> JsonResult<PostResponse> {
    let draft = load_draft(&ctx, &id).await?;
    ensure_can_mutate(&principal, &draft, "You can only publish your own drafts.")?;
    let post = publish_draft_in_db(&ctx.pool, draft.id).await?;
    tracing::info!(draft = draft.id, post = post.id, "published draft");
    Ok(Json(PostResponse::published(post)))
}

/// Unlike posts, a draft update survives a failed removal of the replaced image.
pub async fn update_draft(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    Path(id): Path<String>,
    payload: RequestPayload,
) -> JsonResult<PostResponse> {
    let draft = load_draft(&ctx, &id).await?;
    ensure_can_mutate(&principal, &draft, "You can only update your own drafts.")?;

    let mut input = payload.into_post_input();
    let (title, content) = input.required_text()?;
    let mut image_url = None;
    if input.image.is_some() {
        if let Some(old) = &draft.image_url {
            if let Err(e) = ctx.images.delete(old).await {
                tracing::warn!("Failed to delete replaced image of draft {}: {:#}", draft.id, e);
            }
        }
        image_url = store_image(&ctx, input.image).await?;
    }

    let draft = update_draft_in_db(
        &ctx.pool,
        draft.id,
        PostChanges {
            title,
            content,
            category: input.category,
            image_url,
        },
    )
    .await?;
    Ok(Json(PostResponse::draft(draft)))
}

pub async fn delete_draft(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    Path(id): Path<String>,
) -> JsonResult<&'static str> {
    let draft = load_draft(&ctx, &id).await?;
    ensure_can_mutate(&principal, &draft, "You can only delete your own drafts.")?;

    if let Some(image_url) = &draft.image_url {
        if let Err(e) = ctx.images.delete(image_url).await {
            tracing::warn!("Failed to delete image of draft {}: {:#}", draft.id, e);
        }
    }
    delete_draft_in_db(&ctx.pool, draft.id).await?;
    Ok(Json("Draft deleted successfully."))
}
