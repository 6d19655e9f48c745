pub mod authentication;
pub mod config;
pub mod data_formats;
pub mod db_helpers;
pub mod errors;
mod handlers;
pub mod models;
pub mod newsletter;
pub mod ownership;
pub mod services;
pub mod state;

use std::{any::Any, net::TcpListener, sync::Arc, time::Duration};

use anyhow::Context;
pub use anyhow::Result;
use axum::body::{Bytes, Full};
use axum::extract::DefaultBodyLimit;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method, Response, StatusCode,
};
use axum::{routing::*, Extension, Json, Router};
use handlers::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppContext;

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Room for a 10 MiB image plus the other form fields.
const BODY_LIMIT: usize = 12 * 1024 * 1024;

pub async fn run_app(ctx: Arc<AppContext>) -> Result<()> {
    let address = ctx.config.socket_addr();
    let listener =
        TcpListener::bind(address).with_context(|| format!("Could not bind to {}", address))?;
    tracing::info!("Server started on {}", address);
    serve(listener, make_app(ctx)?).await
}

/// Serves `app` on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
            }
        })
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Could not create database {}", db_url))?;
    } else {
        tracing::info!("Database already exists");
    }
    let pool = SqlitePool::connect(db_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations completed");
    Ok(())
}

pub fn make_router() -> Router {
    let api = Router::new()
        // users
        .route("/users/register", post(register_user))
        .route("/users/login", post(login_user))
        .route("/users/profile", get(get_profile).put(update_profile))
        .route("/users", get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/by-initial/:initial", get(users_by_initial))
        // posts
        .route("/posts", get(get_all_posts))
        .route("/posts/paginated", get(get_posts_paginated))
        .route("/posts/categories/counts", get(get_category_counts))
        .route("/posts/category/:category", get(get_posts_by_category))
        .route("/posts/user/:email/paginated", get(get_posts_by_user))
        .route("/posts/suggestions", post(get_suggestions))
        .route("/posts/create", post(create_post))
        .route("/posts/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/posts/:id/view", post(increment_views))
        .route("/posts/:id/claps", post(increment_claps))
        .route("/posts/:id/comments", get(get_comments).post(add_comment))
        // drafts
        .route("/posts/drafts/user/:email", get(get_drafts_by_user))
        .route(
            "/posts/drafts/:id",
            get(get_draft).put(update_draft).delete(delete_draft),
        )
        .route("/posts/drafts/:id/publish", post(publish_draft))
        // newsletter
        .route("/newsletter/subscribe", post(subscribe))
        .route("/newsletter/unsubscribe", post(unsubscribe))
        .route("/newsletter/send-test-newsletter", post(send_test_newsletter))
        // misc
        .route("/contact", post(submit_contact_form))
        .route("/debug/auth-status", get(auth_status))
        .route("/oauth2/failure", get(oauth_failure));

    Router::new()
        .route("/", get(health))
        .route("/check_health", get(alive))
        .route("/oauth2/authorization/google", get(google_authorize))
        .route("/login/oauth2/code/google", get(google_callback))
        .nest("/api", api)
        .fallback(not_found)
}

/// Router with the application context and the HTTP middleware stack attached.
pub fn make_app(ctx: Arc<AppContext>) -> Result<Router> {
    let origin = HeaderValue::from_str(&ctx.config.frontend_url)
        .context("FRONTEND_URL is not a valid origin")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-auth-token"),
        ])
        .expose_headers([AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    Ok(make_router()
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(Extension(ctx))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Full<Bytes>> {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic"
    };
    tracing::error!("Handler panicked: {}", detail);

    let body = serde_json::json!({ "message": "Internal server error" }).to_string();
    let mut response = Response::new(Full::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
