use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;

use super::{parse_id, store_image, JsonResult};
use crate::{
    authentication::AuthUser,
    data_formats::{
        CategoryPage, PageRequest, PostPage, PostResponse, RequestPayload, SuggestionRequest,
        SuggestionResponse,
    },
    db_helpers::{
        category_counts_in_db, create_post_in_db, delete_post_in_db, get_post_in_db,
        get_user_by_email, increment_claps_in_db, increment_views_in_db, list_all_posts_in_db,
        paginate_posts_in_db, update_post_in_db, NewPost, PostChanges, PostFilter,
    },
    errors::RequestError,
    ownership::ensure_can_mutate,
    state::AppContext,
};

type PostPageJson = PostPage<PostResponse>;

// ----------------- Listing Handlers -----------------
pub async fn get_all_posts(
    Extension(ctx): Extension<Arc<AppContext>>,
) -> JsonResult<Vec<PostResponse>> {
    let posts = list_all_posts_in_db(&ctx.pool).await?;
    Ok(Json(posts.into_iter().map(PostResponse::published).collect()))
}

async fn paged(
    ctx: &AppContext,
    filter: PostFilter<'_>,
    request: &PageRequest,
) -> Result<PostPageJson, RequestError> {
    let (posts, total) = paginate_posts_in_db(&ctx.pool, filter, request).await?;
    Ok(PostPage::new(
        posts.into_iter().map(PostResponse::published).collect(),
        request.page,
        request.size,
        total,
    ))
}

pub async fn get_posts_paginated(
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult<PostPageJson> {
    let request = PageRequest::from_params(&params)?;
    Ok(Json(paged(&ctx, PostFilter::All, &request).await?))
}

pub async fn get_posts_by_category(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(category): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult<PostPageJson> {
    let request = PageRequest::from_params(&params)?;
    Ok(Json(
        paged(&ctx, PostFilter::Category(&category), &request).await?,
    ))
}

/// An unknown author has no posts rather than being an error.
pub async fn get_posts_by_user(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(email): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult<PostPageJson> {
    let request = PageRequest::from_params(&params)?;
    match get_user_by_email(&ctx.pool, &email).await? {
        Some(user) => Ok(Json(
            paged(&ctx, PostFilter::Author(user.id), &request).await?,
        )),
        None => Ok(Json(PostPage::empty(request.page))),
    }
}

pub async fn get_category_counts(
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult<CategoryPage> {
    let request = PageRequest::from_params(&params)?;
    let search = params
        .get("search")
        .map(|term| term.trim())
        .filter(|term| !term.is_empty());
    let (rows, distinct) = category_counts_in_db(&ctx.pool, search, &request).await?;
    Ok(Json(CategoryPage::new(
        rows,
        request.page,
        request.size,
        distinct,
    )))
}

pub async fn get_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(id): Path<String>,
) -> JsonResult<PostResponse> {
    match get_post_in_db(&ctx.pool, parse_id(&id)?).await? {
        Some(post) => Ok(Json(PostResponse::published(post))),
        None => Err(RequestError::NotFound("Post not found")),
    }
}

// ----------------- Engagement Handlers -----------------
pub async fn increment_views(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    increment_views_in_db(&ctx.pool, parse_id(&id)?).await?;
    Ok(StatusCode::OK)
}

/// Missing, unreadable or zero `amount` counts as one clap.
fn clap_amount(params: &HashMap<String, String>) -> Result<i64, RequestError> {
    let amount = params
        .get("amount")
        .and_then(|amount| amount.trim().parse::<i64>().ok())
        .unwrap_or(0);
    match amount {
        0 => Ok(1),
        amount if amount < 0 => Err(RequestError::bad_request("Clap amount must not be negative")),
        amount => Ok(amount),
    }
}

pub async fn increment_claps(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<StatusCode, RequestError> {
    let amount = clap_amount(&params)?;
    increment_claps_in_db(&ctx.pool, parse_id(&id)?, amount).await?;
    Ok(StatusCode::OK)
}

// ----------------- Authoring Handlers -----------------
/// Creates a post, or a draft when `published` is not `true`. The author is named in the body.
pub async fn create_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    payload: RequestPayload,
) -> JsonResult<PostResponse> {
    let mut input = payload.into_create_input();
    let (title, content) = input.post.required_text()?;
    let author_email = match input.author_email {
        Some(author_email) => author_email,
        None => return Err(RequestError::bad_request("Missing required fields")),
    };
    let author = match get_user_by_email(&ctx.pool, &author_email).await? {
        Some(user) => user,
        None => {
            return Err(RequestError::bad_request(format!(
                "User not found: {author_email}"
            )))
        }
    };
    let image_url = store_image(&ctx, input.post.image).await?;

    let record = create_post_in_db(
        &ctx.pool,
        NewPost {
            title,
            content,
            category: input.post.category,
            image_url,
            user_id: author.id,
            created_at: Utc::now(),
        },
        input.published,
    )
    .await?;
    tracing::info!(id = record.id, published = input.published, "created post");
    Ok(Json(if input.published {
        PostResponse::published(record)
    } else {
        PostResponse::draft(record)
    }))
}

/// Replaces title, content and category. A replacement image removes the previous one
/// first; failing to remove it fails the update.
pub async fn update_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    Path(id): Path<String>,
    payload: RequestPayload,
) -> JsonResult<PostResponse> {
    let id = parse_id(&id)?;
    let post = match get_post_in_db(&ctx.pool, id).await? {
        Some(post) => post,
        None => return Err(RequestError::NotFound("Post not found")),
    };
    ensure_can_mutate(&principal, &post, "You can only update your own posts.")?;

    let mut input = payload.into_post_input();
    let (title, content) = input.required_text()?;
    let mut image_url = None;
    if input.image.is_some() {
        if let Some(old) = &post.image_url {
            ctx.images.delete(old).await?;
        }
        image_url = store_image(&ctx, input.image).await?;
    }

    let post = update_post_in_db(
        &ctx.pool,
        id,
        PostChanges {
            title,
            content,
            category: input.category,
            image_url,
        },
    )
    .await?;
    Ok(Json(PostResponse::published(post)))
}

pub async fn delete_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    principal: AuthUser,
    Path(id): Path<String>,
) -> JsonResult<&'static str> {
    let id = parse_id(&id)?;
    let post = match get_post_in_db(&ctx.pool, id).await? {
        Some(post) => post,
        None => return Err(RequestError::NotFound("Post not found")),
    };
    ensure_can_mutate(&principal, &post, "You can only delete your own posts.")?;

    if let Some(image_url) = &post.image_url {
        if let Err(e) = ctx.images.delete(image_url).await {
            tracing::warn!("Failed to delete image of post {}: {:#}", id, e);
        }
    }
    delete_post_in_db(&ctx.pool, id).await?;
    tracing::info!(id, "deleted post");
    Ok(Json("Post deleted successfully."))
}

// ----------------- Assistant Handlers -----------------
pub async fn get_suggestions(
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(request): Json<SuggestionRequest>,
) -> JsonResult<SuggestionResponse> {
    let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
    if blank(&request.title) || blank(&request.content) {
        return Err(RequestError::bad_request(
            "Missing required fields: title or content",
        ));
    }
    let suggestions = ctx
        .suggestions
        .suggest(
            request.title.as_deref().unwrap_or_default(),
            request.content.as_deref().unwrap_or_default(),
        )
        .await;
    Ok(Json(SuggestionResponse { suggestions }))
}
