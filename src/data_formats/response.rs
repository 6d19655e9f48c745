use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Comment, PostRecord, User};

/// Outward view of a user; the password never leaves the server.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegisteredUser {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub profile_image: Option<String>,
}

/// A post or a draft. Drafts omit the `published` flag.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub views: i64,
    pub claps: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub author: AuthorSummary,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub user_id: i64,
    pub author: AuthorSummary,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SuggestionResponse {
    pub suggestions: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub auth_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<AuthStatusUser>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusUser {
    pub email: String,
    pub name: Option<String>,
    pub user_id: i64,
}

impl From<User> for UserResponse {
    fn from(
        User {
            id,
            email,
            name,
            profile_image,
            ..
        }: User,
    ) -> Self {
        UserResponse {
            id,
            email,
            name,
            profile_image,
        }
    }
}

impl PostResponse {
    pub fn published(record: PostRecord) -> Self {
        Self::new(record, Some(true))
    }

    pub fn draft(record: PostRecord) -> Self {
        Self::new(record, None)
    }

    fn new(
        PostRecord {
            id,
            title,
            content,
            category,
            image_url,
            views,
            claps,
            created_at,
            user_id,
            author_name,
            author_email,
            author_image,
        }: PostRecord,
        published: Option<bool>,
    ) -> Self {
        PostResponse {
            id,
            title,
            content,
            category,
            image_url,
            views,
            claps,
            published,
            created_at,
            user_id,
            author: AuthorSummary {
                id: user_id,
                name: author_name,
                email: author_email,
                profile_image: author_image,
            },
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(
        Comment {
            id,
            content,
            created_at,
            post_id,
            user_id,
            author_name,
            author_email,
            author_image,
        }: Comment,
    ) -> Self {
        CommentResponse {
            id,
            content,
            created_at,
            post_id,
            user_id,
            author: AuthorSummary {
                id: user_id,
                name: author_name,
                email: author_email,
                profile_image: author_image,
            },
        }
    }
}
