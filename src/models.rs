use std::str::FromStr;

use chrono::{DateTime, Utc};

/// How an account was created. OAuth accounts hold a random password nobody knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    Local,
    Google,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
        }
    }
}

impl FromStr for AuthProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(AuthProvider::Local),
            "google" => Ok(AuthProvider::Google),
            other => Err(anyhow::anyhow!("unknown auth provider {other}")),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub profile_image: Option<String>,
    pub auth_provider: String,
}

impl User {
    /// Unknown provider strings are treated as local so a password is still demanded.
    pub fn provider(&self) -> AuthProvider {
        self.auth_provider.parse().unwrap_or(AuthProvider::Local)
    }
}

/// A published post or a draft joined with its author. Both tables share this shape.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub views: i64,
    pub claps: i64,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub author_name: Option<String>,
    pub author_email: String,
    pub author_image: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub user_id: i64,
    pub author_name: Option<String>,
    pub author_email: String,
    pub author_image: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub last_email_sent: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryCount {
    pub name: Option<String>,
    pub count: i64,
}
