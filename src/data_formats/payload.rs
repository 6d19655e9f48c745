use std::collections::HashMap;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart},
    http::{header::CONTENT_TYPE, Request},
    Json,
};
use serde_json::Value;

use crate::errors::RequestError;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const IMAGE_FIELDS: [&str; 2] = ["image", "imageFile"];

#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Body of a write request as it arrived: multipart form (with an optional image) or JSON.
/// Resolved once into one of the normalised inputs below.
#[derive(Debug)]
pub enum RequestPayload {
    Multipart {
        fields: HashMap<String, String>,
        file: Option<Upload>,
    },
    Json {
        fields: HashMap<String, String>,
    },
}

/// Normalised post/draft fields.
#[derive(Debug, Default)]
pub struct PostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image: Option<Upload>,
}

#[derive(Debug)]
pub struct CreatePostInput {
    pub post: PostInput,
    pub author_email: Option<String>,
    pub published: bool,
}

#[derive(Debug, Default)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub password: Option<String>,
    pub image: Option<Upload>,
}

impl PostInput {
    /// Title and content are both required to create or replace a post.
    pub fn required_text(&mut self) -> Result<(String, String), RequestError> {
        match (self.title.take(), self.content.take()) {
            (Some(title), Some(content)) => Ok((title, content)),
            _ => Err(RequestError::bad_request("Missing required fields")),
        }
    }
}

impl RequestPayload {
    fn into_parts(self) -> (HashMap<String, String>, Option<Upload>) {
        match self {
            RequestPayload::Multipart { fields, file } => (fields, file),
            RequestPayload::Json { fields } => (fields, None),
        }
    }

    pub fn into_post_input(self) -> PostInput {
        let (mut fields, image) = self.into_parts();
        PostInput {
            title: take(&mut fields, "title"),
            content: take(&mut fields, "content"),
            category: take(&mut fields, "category"),
            image,
        }
    }

    /// `published` defaults to true; only the literal `true` keeps it set.
    pub fn into_create_input(self) -> CreatePostInput {
        let (mut fields, image) = self.into_parts();
        let author_email = take(&mut fields, "authorEmail");
        let published = take(&mut fields, "published")
            .map(|value| value == "true")
            .unwrap_or(true);
        CreatePostInput {
            post: PostInput {
                title: take(&mut fields, "title"),
                content: take(&mut fields, "content"),
                category: take(&mut fields, "category"),
                image,
            },
            author_email,
            published,
        }
    }

    pub fn into_profile_input(self) -> ProfileInput {
        let (mut fields, image) = self.into_parts();
        ProfileInput {
            name: take(&mut fields, "name"),
            email: take(&mut fields, "email"),
            current_password: take(&mut fields, "currentPassword"),
            password: take(&mut fields, "password"),
            image,
        }
    }
}

/// Blank values count as absent.
fn take(fields: &mut HashMap<String, String>, name: &str) -> Option<String> {
    fields.remove(name).filter(|value| !value.trim().is_empty())
}

#[axum::async_trait]
impl<S> FromRequest<S, Body> for RequestPayload
where
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| RequestError::bad_request(e.to_string()))?;
            read_multipart(multipart).await
        } else {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| RequestError::bad_request(e.to_string()))?;
            Ok(RequestPayload::Json {
                fields: json_fields(value)?,
            })
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<RequestPayload, RequestError> {
    let mut fields = HashMap::new();
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RequestError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_owned);
        if file_name.is_some() || IMAGE_FIELDS.contains(&name.as_str()) {
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| RequestError::bad_request(e.to_string()))?;
            if bytes.is_empty() {
                continue;
            }
            let upload = Upload {
                bytes,
                content_type,
                file_name,
            };
            validate_image(&upload)?;
            file = Some(upload);
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| RequestError::bad_request(e.to_string()))?;
            fields.insert(name, text);
        }
    }
    Ok(RequestPayload::Multipart { fields, file })
}

pub fn validate_image(upload: &Upload) -> Result<(), RequestError> {
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        return Err(RequestError::bad_request(
            "File size exceeds maximum limit of 10MB",
        ));
    }
    let is_image = upload
        .content_type
        .as_deref()
        .map(|ct| ct.starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Err(RequestError::bad_request("Only image files are allowed!"));
    }
    Ok(())
}

fn json_fields(value: Value) -> Result<HashMap<String, String>, RequestError> {
    let object = match value {
        Value::Object(object) => object,
        _ => return Err(RequestError::bad_request("Request body must be a JSON object")),
    };
    Ok(object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_payload(value: Value) -> RequestPayload {
        RequestPayload::Json {
            fields: json_fields(value).unwrap(),
        }
    }

    #[test]
    fn published_defaults_to_true() {
        let input = json_payload(json!({"title": "t", "content": "c", "authorEmail": "a@b.c"}))
            .into_create_input();
        assert!(input.published);
        assert_eq!(input.author_email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn published_accepts_bool_and_string_forms() {
        let input = json_payload(json!({"published": false})).into_create_input();
        assert!(!input.published);
        let input = json_payload(json!({"published": true})).into_create_input();
        assert!(input.published);

        let mut fields = HashMap::new();
        fields.insert("published".to_string(), "false".to_string());
        let input = RequestPayload::Multipart { fields, file: None }.into_create_input();
        assert!(!input.published);
    }

    #[test]
    fn multipart_and_json_normalise_identically() {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), "Hello".to_string());
        fields.insert("content".to_string(), "World".to_string());
        fields.insert("category".to_string(), "  ".to_string());
        let upload = Upload {
            bytes: Bytes::from_static(b"png"),
            content_type: Some("image/png".to_string()),
            file_name: Some("a.png".to_string()),
        };
        let from_form = RequestPayload::Multipart {
            fields,
            file: Some(upload),
        }
        .into_post_input();
        let from_json =
            json_payload(json!({"title": "Hello", "content": "World", "category": null}))
                .into_post_input();

        assert_eq!(from_form.title, from_json.title);
        assert_eq!(from_form.content, from_json.content);
        assert_eq!(from_form.category, None);
        assert_eq!(from_json.category, None);
        assert!(from_form.image.is_some());
        assert!(from_json.image.is_none());
    }

    #[test]
    fn replacement_needs_title_and_content() {
        let mut input = json_payload(json!({"title": "t", "content": " "})).into_post_input();
        assert!(matches!(
            input.required_text(),
            Err(RequestError::BadRequest(_))
        ));
        let mut input = json_payload(json!({"title": "t", "content": "c"})).into_post_input();
        assert_eq!(
            input.required_text().unwrap(),
            ("t".to_string(), "c".to_string())
        );
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(json_fields(json!(["title"])).is_err());
    }

    #[test]
    fn image_validation() {
        let mut upload = Upload {
            bytes: Bytes::from_static(b"data"),
            content_type: Some("text/plain".to_string()),
            file_name: None,
        };
        assert!(validate_image(&upload).is_err());
        upload.content_type = Some("image/jpeg".to_string());
        assert!(validate_image(&upload).is_ok());
        upload.bytes = Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]);
        assert!(validate_image(&upload).is_err());
    }
}
