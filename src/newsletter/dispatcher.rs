use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db_helpers::{active_subscribers_in_db, recent_posts_in_db, stamp_last_email_sent_in_db};
use crate::errors::RequestError;
use crate::services::{email_templates, Mailer};
use crate::state::AppContext;

/// Outcome of one dispatcher run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub posts: usize,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub async fn dispatch_newsletter(ctx: &AppContext) -> Result<DispatchReport, RequestError> {
    run_dispatch(&ctx.pool, ctx.mailer.as_ref(), &ctx.config.frontend_url).await
}

/// Sends the digest of the most recent posts to every active subscriber, one at a time.
///
/// Loading posts or subscribers aborts the run. A failed send is logged and the
/// subscriber skipped; `last_email_sent` is only stamped after a successful send.
pub async fn run_dispatch(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    site_url: &str,
) -> Result<DispatchReport, RequestError> {
    let posts = recent_posts_in_db(pool, email_templates::DIGEST_SIZE as i64).await?;
    if posts.is_empty() {
        tracing::info!("no posts yet, newsletter skipped");
        return Ok(DispatchReport::default());
    }
    let subscribers = active_subscribers_in_db(pool).await?;
    let (subject, body) = email_templates::weekly_digest(site_url, &posts)?;

    let mut report = DispatchReport {
        posts: posts.len(),
        ..DispatchReport::default()
    };
    for subscriber in subscribers {
        report.attempted += 1;
        if let Err(e) = mailer.send(&subscriber.email, &subject, &body).await {
            report.failed += 1;
            tracing::error!("Failed to send newsletter to {}: {:#}", subscriber.email, e);
            continue;
        }
        report.delivered += 1;
        if let Err(e) = stamp_last_email_sent_in_db(pool, subscriber.id, Utc::now()).await {
            tracing::error!(
                "Newsletter sent to {} but recording it failed: {}",
                subscriber.email,
                e
            );
        }
    }
    tracing::info!(
        posts = report.posts,
        attempted = report.attempted,
        delivered = report.delivered,
        failed = report.failed,
        "newsletter run finished"
    );
    Ok(report)
}
