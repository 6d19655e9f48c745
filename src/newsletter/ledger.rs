use sqlx::SqlitePool;

use crate::db_helpers::{
    get_subscriber_by_email, insert_subscriber_in_db, set_subscriber_active_in_db,
};
use crate::errors::RequestError;
use crate::services::{send_subscription_confirmation, Mailer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    Reactivated,
}

/// No record or inactive becomes active, followed by a confirmation email.
/// Subscribing while active is a conflict and changes nothing.
pub async fn subscribe(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    site_url: &str,
    email: &str,
) -> Result<SubscribeOutcome, RequestError> {
    let outcome = match get_subscriber_by_email(pool, email).await? {
        Some(subscriber) if subscriber.active => {
            return Err(RequestError::Conflict("Email is already subscribed"));
        }
        Some(subscriber) => {
            set_subscriber_active_in_db(pool, subscriber.id, true).await?;
            SubscribeOutcome::Reactivated
        }
        None => match insert_subscriber_in_db(pool, email).await {
            Ok(_) => SubscribeOutcome::Created,
            // Lost a race against a concurrent subscribe of the same address.
            Err(e) if e.is_unique_violation() => {
                return Err(RequestError::Conflict("Email is already subscribed"))
            }
            Err(e) => return Err(e),
        },
    };
    tracing::info!(email, ?outcome, "newsletter subscription active");
    send_subscription_confirmation(mailer, site_url, email).await;
    Ok(outcome)
}

/// Active becomes inactive. Anything else is reported as not subscribed.
pub async fn unsubscribe(pool: &SqlitePool, email: &str) -> Result<(), RequestError> {
    match get_subscriber_by_email(pool, email).await? {
        Some(subscriber) if subscriber.active => {
            set_subscriber_active_in_db(pool, subscriber.id, false).await?;
            tracing::info!(email, "newsletter subscription cancelled");
            Ok(())
        }
        _ => Err(RequestError::NotFound("Email is not subscribed")),
    }
}
