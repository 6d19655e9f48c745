use std::sync::Arc;

use crate::errors::RequestError;
use crate::models::User;
use crate::state::AppContext;
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const JWT_EXPIRY_DURATION: time::Duration = time::Duration::days(7);

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthClaim {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub user_id: i64,
    pub profile_image: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// The principal attached to a request that carried a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

/// Principal for endpoints that personalise but do not require identity.
/// A missing or broken token simply yields `None`.
pub struct MaybeUser(pub Option<AuthUser>);

fn app_context(parts: &Parts) -> Result<Arc<AppContext>, RequestError> {
    parts
        .extensions
        .get::<Arc<AppContext>>()
        .cloned()
        .ok_or_else(|| RequestError::ServerError(anyhow::anyhow!("application context missing")))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let ctx = app_context(parts)?;
        let token = match bearer_token(&parts.headers) {
            Some(token) => token,
            None => {
                return Err(RequestError::NotAuthorized(
                    "Missing or invalid Authorization header",
                ))
            }
        };
        let claim = verify_jwt_token(&ctx.config.jwt_secret, token)?;
        Ok(AuthUser {
            id: claim.user_id,
            email: claim.email,
            name: claim.name,
            profile_image: claim.profile_image,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(RequestError::NotAuthorized(reason)) => {
                tracing::debug!("continuing without principal: {}", reason);
                Ok(MaybeUser(None))
            }
            Err(e) => Err(e),
        }
    }
}

pub fn get_jwt_token(secret: &str, user: &User) -> Result<String> {
    let now = OffsetDateTime::now_utc();
    let claim = AuthClaim {
        sub: user.email.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        user_id: user.id,
        profile_image: user.profile_image.clone(),
        iat: now.unix_timestamp(),
        exp: (now + JWT_EXPIRY_DURATION).unix_timestamp(),
    };
    encode_claim(secret, &claim)
}

fn encode_claim(secret: &str, claim: &AuthClaim) -> Result<String> {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        claim,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(secret: &str, token: &str) -> Result<AuthClaim, RequestError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Error verifying token: {}", e);
        RequestError::NotAuthorized("Invalid or expired token")
    })?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Invalid or expired token"));
    }
    Ok(claim)
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Stored password hash is malformed"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

/// Opaque password for accounts created through OAuth.
pub fn random_oauth_password() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: 7,
            email: "alice@example.com".to_string(),
            password: String::new(),
            name: Some("Alice".to_string()),
            profile_image: None,
            auth_provider: "local".to_string(),
        }
    }

    #[test]
    fn token_round_trip_carries_identity() {
        let token = get_jwt_token("secret", &alice()).unwrap();
        let claim = verify_jwt_token("secret", &token).unwrap();
        assert_eq!(claim.email, "alice@example.com");
        assert_eq!(claim.sub, "alice@example.com");
        assert_eq!(claim.user_id, 7);
        assert_eq!(claim.name.as_deref(), Some("Alice"));
        assert!(claim.exp > claim.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = get_jwt_token("secret", &alice()).unwrap();
        assert!(matches!(
            verify_jwt_token("another", &token),
            Err(RequestError::NotAuthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let past = OffsetDateTime::now_utc().unix_timestamp() - 3600;
        let claim = AuthClaim {
            sub: "alice@example.com".to_string(),
            email: "alice@example.com".to_string(),
            name: None,
            user_id: 7,
            profile_image: None,
            iat: past - 10,
            exp: past,
        };
        let token = encode_claim("secret", &claim).unwrap();
        assert!(verify_jwt_token("secret", &token).is_err());
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Token abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert("Authorization", "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert("Authorization", "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn password_hash_verifies_only_the_original() {
        let hash = hash_password_argon2("pw1".to_string()).await.unwrap();
        assert!(verify_password_argon2("pw1".to_string(), &hash).await.unwrap());
        assert!(!verify_password_argon2("wrong".to_string(), &hash).await.unwrap());
    }

    #[test]
    fn oauth_password_is_opaque_uuid() {
        let password = random_oauth_password();
        assert_eq!(password.len(), 36);
        assert_ne!(password, random_oauth_password());
    }
}
